//! Pipeline result envelope

use super::{QueryClassification, RetrievalStrategy, RetrievedData};
use serde::Serialize;

/// One point of a trajectory time series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPoint {
    pub timestamp: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub profile_id: Option<String>,
    pub float_id: Option<String>,
}

/// Map/trajectory data for location-bearing queries
#[derive(Debug, Clone, Default, Serialize)]
pub struct VisualizationPayload {
    /// [lat, lon] pairs ordered by timestamp
    pub coordinates: Vec<[f64; 2]>,
    /// LineString feature collection; coordinates are [lon, lat]
    pub geojson: serde_json::Value,
    pub time_series: Vec<TrackPoint>,
    /// Plotting snippet (LLM-generated, deterministic template on failure)
    pub plot_code: String,
    /// Self-contained interactive map document
    pub leaflet_html: String,
}

/// Visualization step outcome; a builder failure never fails the result
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum VisualizationOutcome {
    Payload(VisualizationPayload),
    Error { error: String },
}

/// Result metadata for the caller surface
#[derive(Debug, Clone, Serialize)]
pub struct ResultMetadata {
    pub query_type: RetrievalStrategy,
    pub confidence: f64,
    pub data_sources_used: Vec<String>,
    pub total_results: usize,
}

/// The pipeline's answer to one query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub success: bool,
    pub query: String,
    pub classification: QueryClassification,
    pub retrieved_data: RetrievedData,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization: Option<VisualizationOutcome>,
    pub metadata: ResultMetadata,
}

impl QueryResult {
    /// Error-shaped result; the answer explains what went wrong.
    pub fn error(query: &str, message: &str) -> Self {
        let classification = QueryClassification::fallback("Error occurred during processing");
        let metadata = ResultMetadata {
            query_type: classification.strategy,
            confidence: 0.0,
            data_sources_used: Vec::new(),
            total_results: 0,
        };
        Self {
            success: false,
            query: query.to_string(),
            classification,
            retrieved_data: RetrievedData::default(),
            answer: format!(
                "I encountered an error while processing your query: {message}. \
                 Please try rephrasing your question."
            ),
            visualization: None,
            metadata,
        }
    }
}

/// Component health probe results
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub relational_ok: bool,
    pub vector_ok: bool,
    pub llm_ok: bool,
    pub overall_ok: bool,
}
