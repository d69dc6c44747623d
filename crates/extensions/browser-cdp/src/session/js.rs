//! Script evaluation.

use serde_json::{json, Value};

use crate::error::CdpError;

use super::core::PageSession;

impl PageSession {
    /// Evaluate an expression by value, awaiting promises.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            return Err(CdpError::JavaScript(Self::exception_text(exception)));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Best message from `exceptionDetails`: the thrown description, else the summary text.
    pub(super) fn exception_text(exception: &Value) -> String {
        exception["exception"]["description"]
            .as_str()
            .or_else(|| exception["text"].as_str())
            .unwrap_or("Unknown error")
            .to_string()
    }
}
