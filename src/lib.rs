//! Argonaut: ARGO Float Data Intelligence
//!
//! Natural-language query resolution over oceanographic float profile
//! data, combining structured relational retrieval with semantic vector
//! search and LLM answer synthesis.
//!
//! ## Architecture
//!
//! - **Query Classifier**: rule + LLM signals fused into a routing decision
//! - **SQL Synthesizer**: deterministic templates for recognized query
//!   shapes, schema-constrained LLM generation otherwise
//! - **Retrieval Coordinator**: SQL, vector, or parallel hybrid retrieval
//! - **Response Shaper**: deterministic formatters with LLM prose fallback
//!   and anti-hallucination guards
//! - **LLM Gateway**: dual-provider routing with failover

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extract;
pub mod geo;
pub mod llm;
pub mod pipeline;
pub mod response;
pub mod retrieval;
pub mod sql;
pub mod store;
pub mod types;
pub mod viz;

// Re-export the caller surface
pub use config::Settings;
pub use pipeline::QueryPipeline;

// Re-export commonly used types
pub use types::{
    ExtractedEntities, GenerationMethod, HealthReport, QueryClassification, QueryResult,
    RetrievalStrategy, RetrievedData, Row, SqlValue, VectorHit,
};

// Re-export the store and gateway seams for callers that wire their own
// backends
pub use llm::{LanguageModel, MultiLlmGateway};
pub use store::{PgRelationalStore, RelationalStore, VectorStore};
