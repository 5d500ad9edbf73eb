//! Primary backend - OpenAI-compatible chat completions (Groq)

use super::{ChatMessage, LlmRequest};
use crate::config::PrimaryLlmConfig;
use crate::error::LlmError;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Chat-completions client for the primary provider
#[derive(Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    config: PrimaryLlmConfig,
}

impl GroqClient {
    pub fn new(config: PrimaryLlmConfig, timeout: Duration) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, config })
    }

    /// One completion call. Errors carry the provider status so the
    /// gateway can decide whether to fail over.
    pub async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": request.messages,
            "temperature": request.temperature.unwrap_or(self.config.temperature),
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
        });

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LlmError::ProviderStatus(resp.status()));
        }

        let parsed: ChatCompletionResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyCompletion)
    }

    /// Estimated-token ceiling above which the gateway routes elsewhere.
    pub fn hard_token_limit(&self) -> usize {
        self.config.hard_token_limit
    }
}

/// Render chat messages for providers without native chat support.
pub(super) fn flatten_chat(messages: &[ChatMessage]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(messages.len() + 1);
    for message in messages {
        let tag = match message.role {
            super::Role::System => "[SYSTEM]",
            super::Role::User => "[USER]",
            super::Role::Assistant => "[ASSISTANT]",
        };
        parts.push(format!("{tag}\n{}\n", message.content));
    }
    parts.push("[ASSISTANT]\n".to_string());
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_flatten_chat_order_and_tags() {
        let messages = vec![
            ChatMessage::system("be helpful"),
            ChatMessage::user("hi"),
        ];
        let prompt = flatten_chat(&messages);
        let sys = prompt.find("[SYSTEM]").expect("system tag");
        let user = prompt.find("[USER]").expect("user tag");
        assert!(sys < user);
        assert!(prompt.trim_end().ends_with("[ASSISTANT]"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).expect("serialize");
        assert_eq!(json, "\"assistant\"");
    }
}
