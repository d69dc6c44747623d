//! Content generation protocol.
//!
//! A generator takes a response schema, a prompt and an optional image and
//! returns structured JSON. The engine treats it as a black box and falls
//! back to safe defaults when the output is empty or malformed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::GenerationError;

/// Inline image passed alongside a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data_base64: String,
}

impl ImagePayload {
    pub fn png(data_base64: impl Into<String>) -> Self {
        Self {
            mime_type: "image/png".to_string(),
            data_base64: data_base64.into(),
        }
    }
}

/// A single structured generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Response schema in the generator's schema dialect (OpenAPI subset).
    pub schema: Value,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
}

impl GenerationRequest {
    pub fn new(schema: Value, prompt: impl Into<String>) -> Self {
        Self {
            schema,
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }
}

/// Core trait for structured text generators.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Returns the generator ID.
    fn id(&self) -> &str;

    /// Generate a JSON value conforming (ideally) to `request.schema`.
    async fn generate(&self, request: GenerationRequest) -> Result<Value, GenerationError>;
}

/// Schema for comment/message generation: an array of suggestions.
pub fn comment_schema() -> Value {
    json!({
        "type": "ARRAY",
        "description": "Lists comments that are engaging and have the potential to attract more likes and go viral.",
        "items": {
            "type": "OBJECT",
            "properties": {
                "comment": {
                    "type": "STRING",
                    "description": "A comment between 150 and 250 characters."
                },
                "viralRate": {
                    "type": "NUMBER",
                    "description": "The viral rate, measured on a scale of 0 to 100."
                },
                "commentTokenCount": {
                    "type": "NUMBER",
                    "description": "The total number of tokens in the comment."
                }
            },
            "required": ["comment", "viralRate", "commentTokenCount"]
        }
    })
}

/// One generated suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSuggestion {
    pub comment: String,
    #[serde(default)]
    pub viral_rate: f64,
    #[serde(default)]
    pub comment_token_count: f64,
}

impl CommentSuggestion {
    /// Parse generator output leniently.
    ///
    /// Accepts an array of suggestion objects or a single object. Entries
    /// that fail to parse or carry blank text are dropped.
    pub fn parse_list(value: &Value) -> Vec<CommentSuggestion> {
        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            Value::Object(_) => vec![value],
            _ => Vec::new(),
        };

        items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<CommentSuggestion>(item.clone()).ok())
            .filter(|s| !s.comment.trim().is_empty())
            .collect()
    }

    /// Text of the first usable suggestion.
    pub fn first_text(value: &Value) -> Option<String> {
        Self::parse_list(value)
            .into_iter()
            .next()
            .map(|s| s.comment.trim().to_string())
    }
}

#[cfg(test)]
#[path = "generator_tests.rs"]
mod tests;
