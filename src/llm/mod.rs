//! LLM Gateway
//!
//! Uniform `messages -> completion` interface over two provider backends:
//!
//! - **Primary**: an OpenAI-compatible chat-completions endpoint (Groq).
//!   Fast, token-capped.
//! - **Secondary**: a text-generation inference endpoint (Hugging Face)
//!   with a code-tuned model for plotting snippets and a per-backend
//!   fallback model.
//!
//! Routing prefers the secondary backend for visualization/code intent and
//! for prompts whose estimated token count exceeds the primary's hard cap;
//! on failure the other backend is tried. Every call carries a timeout.
//! Callers always have a deterministic branch for gateway failure.

mod gateway;
mod groq;
mod hugging_face;
pub mod prompts;

pub use gateway::{estimate_tokens, MultiLlmGateway};
pub use groq::GroqClient;
pub use hugging_face::HuggingFaceClient;

use crate::error::LlmError;
use serde::{Deserialize, Serialize};

/// Chat roles accepted by both providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A gateway request; callers see only `request -> String`
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Prefer the code-tuned model on the secondary backend
    pub use_code_model: bool,
}

impl LlmRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
            use_code_model: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_code_model(mut self) -> Self {
        self.use_code_model = true;
        self
    }

    /// Concatenated message text, used for routing heuristics.
    pub fn full_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The seam every LLM-consuming component depends on.
///
/// Production code uses [`MultiLlmGateway`]; tests substitute canned
/// implementations.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: &LlmRequest) -> Result<String, LlmError>;
}
