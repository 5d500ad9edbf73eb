//! Error types for the query resolution pipeline
//!
//! Each I/O client gets its own error enum; the orchestrator maps all of
//! them into a user-facing error result rather than propagating.

use thiserror::Error;

/// LLM gateway errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider returned status {0}")]
    ProviderStatus(reqwest::StatusCode),
    #[error("Response missing completion text")]
    EmptyCompletion,
    #[error("Failed to parse provider response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("All providers failed: {0}")]
    AllProvidersFailed(String),
}

/// Relational store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Unsupported column type {type_name} for column {column}")]
    UnsupportedColumnType { column: String, type_name: String },
}

/// Vector store errors
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {0}")]
    ServerStatus(reqwest::StatusCode),
    #[error("Malformed search response: {0}")]
    Malformed(String),
}

/// Visualization builder errors
#[derive(Debug, Error)]
pub enum VisualizationError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// SQL synthesis errors
#[derive(Debug, Error)]
pub enum SqlGenerationError {
    #[error("LLM generation failed: {0}")]
    Llm(#[from] LlmError),
    #[error("Generated statement failed validation: {0}")]
    Invalid(String),
}
