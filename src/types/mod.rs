//! Core types for the query resolution pipeline
//!
//! All payloads crossing component boundaries are tagged records; the only
//! dynamic shape is `Row`, which mirrors whatever columns a SQL statement
//! projected.

mod classification;
mod result;
mod retrieval;
mod row;

pub use classification::{ExtractedEntities, QueryClassification, RetrievalStrategy};
pub use result::{
    HealthReport, QueryResult, ResultMetadata, TrackPoint, VisualizationOutcome,
    VisualizationPayload,
};
pub use retrieval::{
    DatabaseStats, GenerationMethod, HitMetadata, RetrievedData, SqlSynthesis, VectorHit,
};
pub use row::{Row, SqlValue};
