//! Response Shaper
//!
//! Chooses between deterministic data-based formatting and LLM-generated
//! prose. Data-bearing queries never reach the LLM: presenting retrieved
//! records verbatim is the strongest guard against invented values. The
//! LLM path is reserved for conceptual questions, and its reply is
//! discarded for the raw-data formatter whenever it looks generic.

pub mod format;
pub mod formatters;

use crate::llm::{prompts, ChatMessage, LanguageModel, LlmRequest};
use crate::sql::mentions_equator;
use crate::store::RelationalStore;
use crate::types::{
    GenerationMethod, QueryClassification, RetrievalStrategy, RetrievedData, SqlValue,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Tokens marking a query as data-bearing: the answer must come from the
/// deterministic formatter, never LLM prose.
pub const DATA_QUERY_TOKENS: &[&str] = &[
    "show",
    "find",
    "get",
    "list",
    "display",
    "float",
    "data",
    "profile",
    "temperature",
    "salinity",
    "trajectory",
    "trajectories",
    "location",
    "coordinates",
    "map",
    "bay",
    "ocean",
    "sea",
    "equator",
    "near",
];

/// Whether the query carries any data-bearing token.
pub fn is_data_query(query: &str) -> bool {
    let q = query.to_lowercase();
    DATA_QUERY_TOKENS.iter().any(|token| q.contains(token))
}

/// Canned phrases that mark an LLM reply as useless
const GENERIC_REPLY_MARKERS: &[&str] = &[
    "query processed successfully",
    "no data found",
    "no data available",
];

/// Minimum length for an LLM reply to count as substantial
const MIN_SUBSTANTIAL_REPLY: usize = 50;

pub struct ResponseShaper {
    gateway: Arc<dyn LanguageModel>,
    store: Arc<dyn RelationalStore>,
}

impl ResponseShaper {
    pub fn new(gateway: Arc<dyn LanguageModel>, store: Arc<dyn RelationalStore>) -> Self {
        Self { gateway, store }
    }

    /// Produce the answer string. First matching formatter wins.
    pub async fn shape(
        &self,
        user_query: &str,
        classification: &QueryClassification,
        data: &RetrievedData,
    ) -> String {
        if data.is_empty() {
            return formatters::no_results(user_query, &classification.entities, self.store.as_ref())
                .await;
        }

        if self.is_year_comparison(user_query, data) {
            info!("Using deterministic year-comparison formatter");
            return formatters::year_comparison(
                &data.sql_rows,
                mentions_equator(user_query),
                self.store.as_ref(),
            )
            .await;
        }

        if self.is_float_not_found(user_query, data) {
            info!("Using deterministic float-not-found formatter");
            return formatters::float_not_found(
                user_query,
                self.store.as_ref(),
                data.database_stats.as_ref(),
            )
            .await;
        }

        if is_data_query(user_query) {
            info!("Using raw-data formatter for data query");
            return formatters::raw_data(user_query, data);
        }

        self.llm_prose(user_query, classification.strategy, data).await
    }

    /// Comparison wording + the comparison template + year-tagged rows.
    fn is_year_comparison(&self, query: &str, data: &RetrievedData) -> bool {
        let q = query.to_lowercase();
        let has_comparison_wording = ["compare", "versus", "vs", "between", "comparison", "compared"]
            .iter()
            .any(|k| q.contains(k));
        has_comparison_wording
            && data.generation_method == Some(GenerationMethod::YearComparisonDirect)
            && data.sql_rows.iter().any(|r| r.contains_column("year"))
    }

    /// A float-id query whose statement returned one all-NULL row.
    fn is_float_not_found(&self, query: &str, data: &RetrievedData) -> bool {
        formatters::extract_float_id(query).is_some()
            && data.sql_rows.len() == 1
            && data.sql_rows[0].all_null()
    }

    async fn llm_prose(
        &self,
        user_query: &str,
        strategy: RetrievalStrategy,
        data: &RetrievedData,
    ) -> String {
        let has_arrays = data.sql_rows.first().is_some_and(|row| {
            row.iter()
                .any(|(_, value)| matches!(value, SqlValue::FloatArray(_)))
        });

        let mut system_prompt =
            prompts::response_system_prompt(strategy, data.sql_rows.len(), has_arrays);
        system_prompt.push_str(&format!(
            "\n\nThe user asked: \"{user_query}\"\nReport exactly what the database contains, nothing more."
        ));

        let request = LlmRequest::new(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(format!(
                "Retrieved database results: {}\n\nReport exactly what this data contains for \
                 the user's query. Do not add any analysis beyond what the actual data supports.",
                prompts::summarize_for_llm(data)
            )),
        ])
        .with_temperature(if strategy == RetrievalStrategy::Sql { 0.1 } else { 0.2 });

        match self.gateway.generate(&request).await {
            Ok(reply) if is_substantial(&reply) => reply,
            Ok(_) => {
                info!("LLM returned generic response, using data-based fallback");
                formatters::raw_data(user_query, data)
            }
            Err(e) => {
                warn!(error = %e, "LLM response generation failed, using data-based fallback");
                formatters::raw_data(user_query, data)
            }
        }
    }
}

/// A reply counts only when nonempty, non-canned, and long enough.
fn is_substantial(reply: &str) -> bool {
    let trimmed = reply.trim();
    if trimmed.len() < MIN_SUBSTANTIAL_REPLY {
        return false;
    }
    let lower = trimmed.to_lowercase();
    !GENERIC_REPLY_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LlmError, StoreError};
    use crate::store::RelationalStore;
    use crate::types::{DatabaseStats, Row};
    use async_trait::async_trait;

    struct CannedGateway {
        reply: Option<String>,
    }

    #[async_trait]
    impl LanguageModel for CannedGateway {
        async fn generate(&self, _request: &LlmRequest) -> Result<String, LlmError> {
            self.reply
                .clone()
                .ok_or_else(|| LlmError::AllProvidersFailed("down".to_string()))
        }
    }

    struct CannedStore;

    #[async_trait]
    impl RelationalStore for CannedStore {
        async fn query(&self, _sql: &str) -> Result<Vec<Row>, StoreError> {
            Ok(Vec::new())
        }
        async fn stats(&self) -> Result<DatabaseStats, StoreError> {
            Ok(DatabaseStats::default())
        }
        async fn ping(&self) -> bool {
            true
        }
    }

    fn shaper(reply: Option<&str>) -> ResponseShaper {
        ResponseShaper::new(
            Arc::new(CannedGateway {
                reply: reply.map(String::from),
            }),
            Arc::new(CannedStore),
        )
    }

    fn classification() -> QueryClassification {
        QueryClassification::fallback("test")
    }

    fn row_with(entries: &[(&str, SqlValue)]) -> Row {
        let mut row = Row::new();
        for (name, value) in entries {
            row.push(*name, value.clone());
        }
        row
    }

    #[test]
    fn test_data_query_token_detection() {
        assert!(is_data_query("show me temperature"));
        assert!(is_data_query("trajectories near the equator"));
        assert!(!is_data_query("why is the water warm?"));
    }

    #[test]
    fn test_is_substantial() {
        assert!(!is_substantial(""));
        assert!(!is_substantial("ok"));
        assert!(!is_substantial(
            "Query processed successfully with no further details to report here."
        ));
        assert!(is_substantial(
            "Based on the retrieved data, 42 profiles were collected in the Bay of Bengal during 2023."
        ));
    }

    #[tokio::test]
    async fn test_data_query_bypasses_llm() {
        // Gateway would fail; the data-bearing token forces the raw-data
        // formatter so the failure never surfaces.
        let shaper = shaper(None);
        let data = RetrievedData {
            sql_rows: vec![row_with(&[("count", SqlValue::Int(7))])],
            total_count: Some(7),
            ..Default::default()
        };
        let answer = shaper.shape("show profile count", &classification(), &data).await;
        assert!(answer.contains("**Total Count**: 7"));
    }

    #[tokio::test]
    async fn test_generic_llm_reply_falls_back() {
        let shaper = shaper(Some("No data available"));
        let data = RetrievedData {
            sql_rows: vec![row_with(&[("count", SqlValue::Int(3))])],
            total_count: Some(3),
            ..Default::default()
        };
        // No data-bearing token: goes to the LLM, whose generic reply is
        // replaced by the raw-data formatter.
        let answer = shaper.shape("anything interesting?", &classification(), &data).await;
        assert!(answer.contains("**Total Count**: 3"));
    }

    #[tokio::test]
    async fn test_float_not_found_detection() {
        let shaper = shaper(None);
        let data = RetrievedData {
            sql_rows: vec![row_with(&[("max", SqlValue::Null)])],
            ..Default::default()
        };
        let answer = shaper
            .shape("Float 9999999 temperature data", &classification(), &data)
            .await;
        assert!(answer.contains("Float 9999999 Not Found"));
        assert!(answer.contains("does not exist"));
    }

    #[tokio::test]
    async fn test_empty_retrieval_reports_missing_float() {
        let shaper = shaper(None);
        let data = RetrievedData::default();
        let answer = shaper
            .shape("Float 1234567 salinity", &classification(), &data)
            .await;
        // CannedStore returns no rows, so the float lookup reports absence.
        assert!(answer.contains("1234567"));
        assert!(answer.contains("does not exist"));
    }
}
