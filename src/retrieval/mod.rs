//! Retrieval Coordinator
//!
//! Executes the retrieval strategy the classifier chose: SQL-only,
//! vector-only, or both in parallel. Degradation rules:
//!
//! - SQL path failure degrades to vector retrieval.
//! - Vector path failure returns an empty retrieval with an error message.
//! - In the hybrid path the two legs run concurrently; whichever survives
//!   contributes its results.

use crate::catalog::{self, Region};
use crate::sql::SqlSynthesizer;
use crate::store::{RelationalStore, VectorStore};
use crate::types::{
    GenerationMethod, QueryClassification, RetrievalStrategy, RetrievedData, SqlValue, VectorHit,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-term cap on supplementary entity searches
const SUPPLEMENTARY_LIMIT: usize = 5;

pub struct RetrievalCoordinator {
    store: Arc<dyn RelationalStore>,
    vector: Arc<dyn VectorStore>,
    synthesizer: SqlSynthesizer,
}

impl RetrievalCoordinator {
    pub fn new(
        store: Arc<dyn RelationalStore>,
        vector: Arc<dyn VectorStore>,
        synthesizer: SqlSynthesizer,
    ) -> Self {
        Self {
            store,
            vector,
            synthesizer,
        }
    }

    /// Run the chosen retrieval strategy. Never errors; failures surface
    /// inside the returned data.
    pub async fn retrieve(
        &self,
        user_query: &str,
        classification: &QueryClassification,
        max_results: usize,
    ) -> RetrievedData {
        let mut data = match classification.strategy {
            RetrievalStrategy::Sql => self.sql_retrieval(user_query, classification, max_results).await,
            RetrievalStrategy::Vector => self.vector_retrieval(user_query, classification, max_results).await,
            RetrievalStrategy::Hybrid => self.hybrid_retrieval(user_query, classification, max_results).await,
        };

        // Statistics snapshot is context, not a hard requirement.
        match self.store.stats().await {
            Ok(stats) => data.database_stats = Some(stats),
            Err(e) => warn!(error = %e, "Database statistics unavailable"),
        }

        data
    }

    async fn sql_retrieval(
        &self,
        user_query: &str,
        classification: &QueryClassification,
        max_results: usize,
    ) -> RetrievedData {
        let synthesis = self.synthesizer.synthesize(user_query).await;

        let rows = match self.store.query(&synthesis.sql).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, sql = %synthesis.sql, "SQL execution failed, degrading to vector retrieval");
                return self.vector_retrieval(user_query, classification, max_results).await;
            }
        };

        // Companion count is best-effort; the row count is always a valid
        // lower bound. Nearest-floats results are already the full set.
        let total_count = if synthesis.method == GenerationMethod::NearestFloatsDirect {
            rows.len() as i64
        } else if let Some(count_sql) = &synthesis.count_sql {
            match self.store.query(count_sql).await {
                Ok(count_rows) => count_rows
                    .first()
                    .and_then(|r| r.get("count"))
                    .and_then(SqlValue::as_i64)
                    .unwrap_or(rows.len() as i64),
                Err(e) => {
                    warn!(error = %e, "Count companion failed, using row count");
                    rows.len() as i64
                }
            }
        } else {
            rows.len() as i64
        };

        info!(
            result_count = rows.len(),
            total_count,
            method = %synthesis.method,
            "SQL retrieval complete"
        );

        RetrievedData {
            sql_rows: rows,
            sql_text: Some(synthesis.sql),
            sql_explanation: Some(synthesis.explanation),
            generation_method: Some(synthesis.method),
            generation_error: synthesis.error,
            total_count: Some(total_count),
            ..Default::default()
        }
    }

    async fn vector_retrieval(
        &self,
        user_query: &str,
        classification: &QueryClassification,
        max_results: usize,
    ) -> RetrievedData {
        let hits = match self.vector.semantic_search(user_query, max_results).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, "Vector retrieval failed");
                return RetrievedData {
                    error: Some(format!("Vector retrieval failed: {e}")),
                    ..Default::default()
                };
            }
        };

        let before = hits.len();
        let mut hits = filter_by_region(user_query, hits);
        info!(before, after = hits.len(), "Geographic post-filtering applied");

        // Supplementary single-term searches for extracted entities.
        for parameter in &classification.entities.parameters {
            if let Ok(extra) = self
                .vector
                .search_by_parameter(parameter, SUPPLEMENTARY_LIMIT)
                .await
            {
                hits.extend(extra);
            }
        }
        for region in &classification.entities.regions {
            if let Ok(extra) = self
                .vector
                .search_by_region(region, SUPPLEMENTARY_LIMIT)
                .await
            {
                hits.extend(extra);
            }
        }

        let unique = dedup_hits(hits, max_results);

        RetrievedData {
            vector_hits: unique,
            ..Default::default()
        }
    }

    async fn hybrid_retrieval(
        &self,
        user_query: &str,
        classification: &QueryClassification,
        max_results: usize,
    ) -> RetrievedData {
        let budget = (max_results / 2).max(1);
        let (sql_data, vector_data) = tokio::join!(
            self.sql_retrieval(user_query, classification, budget),
            self.vector_retrieval(user_query, classification, budget),
        );

        RetrievedData {
            sql_rows: sql_data.sql_rows,
            vector_hits: vector_data.vector_hits,
            sql_text: sql_data.sql_text,
            sql_explanation: sql_data.sql_explanation,
            generation_method: sql_data.generation_method,
            generation_error: sql_data.generation_error,
            total_count: sql_data.total_count,
            error: match (sql_data.error, vector_data.error) {
                (Some(sql_err), Some(vec_err)) => {
                    Some(format!("SQL: {sql_err}; Vector: {vec_err}"))
                }
                _ => None,
            },
            ..Default::default()
        }
    }
}

/// Strict region filter on hit metadata, with graceful broadening: if the
/// tight rectangle leaves nothing and the region has a broad rectangle,
/// re-filter against it and annotate the survivors.
fn filter_by_region(user_query: &str, hits: Vec<VectorHit>) -> Vec<VectorHit> {
    let Some(region) = catalog::find_region(user_query) else {
        return hits;
    };

    let strict: Vec<VectorHit> = hits
        .iter()
        .filter(|hit| within(region, hit, false))
        .cloned()
        .collect();
    if !strict.is_empty() {
        return strict;
    }

    let (Some(broad_label), true) = (region.broad_label, region.broad.is_some()) else {
        return strict;
    };

    info!(region = region.name, "No hits in strict region, broadening");
    hits.into_iter()
        .filter(|hit| within(region, hit, true))
        .map(|mut hit| {
            hit.metadata.geographic_note = Some(format!(
                "Using {broad_label} (no specific data found in requested region)"
            ));
            hit
        })
        .collect()
}

fn within(region: &Region, hit: &VectorHit, broad: bool) -> bool {
    let rect = if broad {
        match region.broad {
            Some(rect) => rect,
            None => return false,
        }
    } else {
        region.bounds
    };
    match (hit.metadata.latitude, hit.metadata.longitude) {
        (Some(lat), Some(lon)) => rect.contains(lat, lon),
        // Hits without coordinates survive the strict pass only.
        _ => !broad,
    }
}

/// Deduplicate by hit id, preserving first-seen order, capped at the
/// result budget.
fn dedup_hits(hits: Vec<VectorHit>, max_results: usize) -> Vec<VectorHit> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();
    for hit in hits {
        if seen.insert(hit.id.clone()) {
            unique.push(hit);
            if unique.len() >= max_results {
                break;
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HitMetadata;

    fn hit(id: &str, lat: Option<f64>, lon: Option<f64>) -> VectorHit {
        VectorHit {
            id: id.to_string(),
            document: format!("summary {id}"),
            metadata: HitMetadata {
                latitude: lat,
                longitude: lon,
                ..Default::default()
            },
            distance: 0.5,
        }
    }

    #[test]
    fn test_filter_keeps_all_without_region() {
        let hits = vec![hit("a", Some(0.0), Some(0.0)), hit("b", None, None)];
        let filtered = filter_by_region("how many profiles in 2023", hits);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_strict_filter_inside_region() {
        let hits = vec![
            hit("inside", Some(15.0), Some(90.0)),
            hit("outside", Some(-30.0), Some(60.0)),
            hit("no_coords", None, None),
        ];
        let filtered = filter_by_region("temperature in the bay of bengal", hits);
        let ids: Vec<&str> = filtered.iter().map(|h| h.id.as_str()).collect();
        assert!(ids.contains(&"inside"));
        assert!(!ids.contains(&"outside"));
        // Hits without coordinates survive the strict pass.
        assert!(ids.contains(&"no_coords"));
    }

    #[test]
    fn test_broadened_filter_annotates_hits() {
        // Inside the broad Bay of Bengal rectangle but outside the tight one.
        let hits = vec![hit("broadened", Some(-5.0), Some(70.0))];
        let filtered = filter_by_region("salinity in the bay of bengal", hits);
        assert_eq!(filtered.len(), 1);
        let note = filtered[0]
            .metadata
            .geographic_note
            .as_deref()
            .expect("note");
        assert!(note.contains("broader Indian Ocean region"));
    }

    #[test]
    fn test_dedup_preserves_first_seen() {
        let hits = vec![hit("a", None, None), hit("b", None, None), hit("a", None, None)];
        let unique = dedup_hits(hits, 10);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].id, "a");
        assert_eq!(unique[1].id, "b");
    }

    #[test]
    fn test_dedup_respects_budget() {
        let hits: Vec<VectorHit> = (0..10).map(|i| hit(&format!("h{i}"), None, None)).collect();
        assert_eq!(dedup_hits(hits, 3).len(), 3);
    }
}
