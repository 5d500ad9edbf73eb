//! Secondary backend - text-generation inference API (Hugging Face)
//!
//! Chat messages are flattened into a tagged prompt because the inference
//! API takes plain text. The code-tuned model serves plotting-snippet
//! requests; the per-backend fallback model absorbs model-level outages.

use super::groq::flatten_chat;
use super::LlmRequest;
use crate::config::SecondaryLlmConfig;
use crate::error::LlmError;
use std::time::Duration;
use tracing::warn;

/// Inference-API client for the secondary provider
#[derive(Clone)]
pub struct HuggingFaceClient {
    http: reqwest::Client,
    config: SecondaryLlmConfig,
}

impl HuggingFaceClient {
    pub fn new(config: SecondaryLlmConfig, timeout: Duration) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, config })
    }

    async fn invoke(&self, model: &str, request: &LlmRequest) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "inputs": flatten_chat(&request.messages),
            "parameters": {
                "temperature": request.temperature.unwrap_or(self.config.temperature),
                "max_new_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
                "return_full_text": false,
            }
        });

        let resp = self
            .http
            .post(format!(
                "{}/{model}",
                self.config.base_url.trim_end_matches('/')
            ))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LlmError::ProviderStatus(resp.status()));
        }

        let data: serde_json::Value = resp.json().await?;
        extract_generated_text(&data).ok_or(LlmError::EmptyCompletion)
    }

    /// Generate with the request-appropriate model, falling back to the
    /// configured fallback model on failure.
    pub async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let model = if request.use_code_model {
            &self.config.code_model
        } else {
            &self.config.text_model
        };

        match self.invoke(model, request).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(model = %model, error = %e, "Primary model failed, trying fallback model");
                self.invoke(&self.config.fallback_model, request).await
            }
        }
    }
}

/// The inference API returns either a list of generations or a bare object.
fn extract_generated_text(data: &serde_json::Value) -> Option<String> {
    let text = match data {
        serde_json::Value::Array(items) => items
            .first()
            .and_then(|item| item.get("generated_text"))
            .and_then(|t| t.as_str()),
        serde_json::Value::Object(_) => data.get("generated_text").and_then(|t| t.as_str()),
        _ => None,
    }?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_list_shape() {
        let data = serde_json::json!([{"generated_text": "  hello  "}]);
        assert_eq!(extract_generated_text(&data).as_deref(), Some("hello"));
    }

    #[test]
    fn test_extract_from_object_shape() {
        let data = serde_json::json!({"generated_text": "world"});
        assert_eq!(extract_generated_text(&data).as_deref(), Some("world"));
    }

    #[test]
    fn test_extract_rejects_empty() {
        let data = serde_json::json!([{"generated_text": "   "}]);
        assert!(extract_generated_text(&data).is_none());
        let data = serde_json::json!({"unexpected": true});
        assert!(extract_generated_text(&data).is_none());
    }
}
