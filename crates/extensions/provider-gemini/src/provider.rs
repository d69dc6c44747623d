//! Gemini-backed [`ContentGenerator`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use autoengage_protocols::{ContentGenerator, GenerationError, GenerationRequest};

use crate::client::GeminiClient;
use crate::types::*;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Structured JSON generation through Gemini.
pub struct GeminiGenerator {
    client: GeminiClient,
    model: String,
    temperature: Option<f32>,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        Self::with_options(api_key, None, DEFAULT_MODEL, Duration::from_secs(60))
    }

    pub fn with_options(
        api_key: impl Into<String>,
        base_url: Option<&str>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerationError::NotConfigured(
                "Gemini API key is empty".to_string(),
            ));
        }
        Ok(Self {
            client: GeminiClient::new(api_key, base_url, timeout)?,
            model: model.into(),
            temperature: None,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn build_request(&self, request: &GenerationRequest) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = &request.image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data_base64.clone(),
                },
            });
        }
        parts.push(Part::Text {
            text: request.prompt.clone(),
        });

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: Some(GenerationConfig {
                temperature: self.temperature,
                response_mime_type: Some("application/json".to_string()),
                response_schema: (!request.schema.is_null()).then(|| request.schema.clone()),
                ..Default::default()
            }),
        }
    }
}

/// Parse model text as JSON, tolerating a Markdown code fence around it.
pub(crate) fn parse_json_text(text: &str) -> Result<Value, GenerationError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced.trim())
        .map_err(|e| GenerationError::InvalidResponse(format!("Model output is not JSON: {}", e)))
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Value, GenerationError> {
        let body = self.build_request(&request);
        let response = self.client.generate_content(&self.model, &body).await?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Gemini usage"
            );
        }

        let Some(text) = response.text() else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .or_else(|| response.candidates.first().and_then(|c| c.finish_reason.clone()))
                .unwrap_or_else(|| "no candidates".to_string());
            warn!(reason = %reason, "Gemini returned no text");
            return Err(GenerationError::InvalidResponse(format!(
                "Empty response: {}",
                reason
            )));
        };

        parse_json_text(&text)
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
