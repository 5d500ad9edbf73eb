//! Retrieval payload types

use super::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the executed SQL statement was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    OperatingDurationDirect,
    YearCountDirect,
    NearestFloatsDirect,
    YearComparisonDirect,
    GeographicDirect,
    IntelligentLlm,
    /// Safe substitute after a generation or validation failure
    Fallback,
}

impl GenerationMethod {
    /// Direct templates carry their own LIMIT; the coordinator must not
    /// append another.
    pub fn has_builtin_limit(&self) -> bool {
        matches!(
            self,
            GenerationMethod::GeographicDirect
                | GenerationMethod::NearestFloatsDirect
                | GenerationMethod::YearComparisonDirect
        )
    }
}

impl fmt::Display for GenerationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationMethod::OperatingDurationDirect => "operating_duration_direct",
            GenerationMethod::YearCountDirect => "year_count_direct",
            GenerationMethod::NearestFloatsDirect => "nearest_floats_direct",
            GenerationMethod::YearComparisonDirect => "year_comparison_direct",
            GenerationMethod::GeographicDirect => "geographic_direct",
            GenerationMethod::IntelligentLlm => "intelligent_llm",
            GenerationMethod::Fallback => "fallback",
        };
        write!(f, "{name}")
    }
}

/// Output of the SQL synthesizer
#[derive(Debug, Clone, Serialize)]
pub struct SqlSynthesis {
    pub sql: String,
    pub explanation: String,
    pub estimated_results: String,
    pub parameters_used: Vec<String>,
    pub method: GenerationMethod,
    /// Companion COUNT statement reporting the full population size
    pub count_sql: Option<String>,
    /// Populated when a fallback statement was substituted
    pub error: Option<String>,
}

/// Metadata attached to a vector store hit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitMetadata {
    pub float_id: Option<String>,
    pub profile_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: Option<String>,
    /// Set when the hit survived only the broadened geographic filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geographic_note: Option<String>,
}

/// One semantic search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorHit {
    pub id: String,
    pub document: String,
    pub metadata: HitMetadata,
    /// Similarity distance (smaller is closer)
    pub distance: f64,
}

/// Snapshot of aggregate database statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseStats {
    pub total_profiles: i64,
    pub total_floats: i64,
    pub earliest_profile: Option<chrono::NaiveDate>,
    pub latest_profile: Option<chrono::NaiveDate>,
}

/// Everything a retrieval pass produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievedData {
    pub sql_rows: Vec<Row>,
    pub vector_hits: Vec<VectorHit>,
    pub sql_text: Option<String>,
    pub sql_explanation: Option<String>,
    pub generation_method: Option<GenerationMethod>,
    pub generation_error: Option<String>,
    /// Full population size for the displayed window, when known
    pub total_count: Option<i64>,
    pub database_stats: Option<DatabaseStats>,
    /// Retrieval-level failure message (empty retrieval, not a crash)
    pub error: Option<String>,
}

impl RetrievedData {
    pub fn is_empty(&self) -> bool {
        self.sql_rows.is_empty() && self.vector_hits.is_empty()
    }

    pub fn total_results(&self) -> usize {
        self.sql_rows.len() + self.vector_hits.len()
    }

    /// Human names of the stores that contributed results.
    pub fn data_sources(&self) -> Vec<String> {
        let mut sources = Vec::new();
        if !self.sql_rows.is_empty() {
            sources.push("PostgreSQL database".to_string());
        }
        if !self.vector_hits.is_empty() {
            sources.push("Vector database (semantic search)".to_string());
        }
        sources
    }
}
