//! Navigation.

use std::time::{Duration, Instant};

use serde_json::json;
use tracing::debug;

use crate::error::CdpError;

use super::core::PageSession;

const POLL: Duration = Duration::from_millis(100);

impl PageSession {
    /// Navigate and wait for the document to load.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), CdpError> {
        let result = self
            .call("Page.navigate", Some(json!({ "url": url })))
            .await?;

        if let Some(error) = result.get("errorText").and_then(|e| e.as_str()) {
            return Err(CdpError::NavigationFailed(format!("{}: {}", url, error)));
        }

        self.wait_for_load(timeout).await?;
        debug!("Navigated to {}", url);
        Ok(())
    }

    /// Poll `document.readyState` until it is interactive or complete.
    pub async fn wait_for_load(&self, timeout: Duration) -> Result<(), CdpError> {
        let start = Instant::now();
        loop {
            // A navigation in flight can destroy the context mid-evaluate.
            match self.evaluate("document.readyState").await {
                Ok(state) if matches!(state.as_str(), Some("complete" | "interactive")) => {
                    return Ok(());
                }
                Ok(_) | Err(CdpError::JavaScript(_)) | Err(CdpError::Protocol { .. }) => {}
                Err(e) => return Err(e),
            }

            if start.elapsed() > timeout {
                return Err(CdpError::Timeout("Page load timeout".to_string()));
            }
            tokio::time::sleep(POLL).await;
        }
    }

    /// Step back one history entry, if there is one.
    pub async fn go_back(&self, timeout: Duration) -> Result<(), CdpError> {
        let history = self.call("Page.getNavigationHistory", None).await?;
        let current_index = history["currentIndex"].as_i64().unwrap_or(0);
        if current_index <= 0 {
            return Ok(());
        }

        let entry_id = history["entries"]
            .as_array()
            .and_then(|entries| entries.get((current_index - 1) as usize))
            .and_then(|entry| entry["id"].as_i64());
        if let Some(entry_id) = entry_id {
            self.call(
                "Page.navigateToHistoryEntry",
                Some(json!({ "entryId": entry_id })),
            )
            .await?;
            self.wait_for_load(timeout).await?;
        }
        Ok(())
    }

    pub async fn get_url(&self) -> Result<String, CdpError> {
        let result = self.evaluate("window.location.href").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }
}
