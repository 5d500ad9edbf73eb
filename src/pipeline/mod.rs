//! Pipeline Orchestrator
//!
//! End-to-end control flow for one query:
//!
//! ```text
//! classify -> coverage-info short-circuit -> coverage validation
//!   -> SQL force override -> retrieve -> shape -> visualization -> result
//! ```
//!
//! Every invocation returns a `QueryResult`; callers never see an
//! exception from the core. All clients are built once at startup and
//! shared by reference across concurrent invocations.

use crate::classifier::QueryClassifier;
use crate::config::Settings;
use crate::geo::GeographicValidator;
use crate::llm::{ChatMessage, LanguageModel, LlmRequest};
use crate::response::{is_data_query, ResponseShaper};
use crate::retrieval::RetrievalCoordinator;
use crate::sql::SqlSynthesizer;
use crate::store::{RelationalStore, VectorStore};
use crate::types::{
    GenerationMethod, HealthReport, QueryClassification, QueryResult, ResultMetadata,
    RetrievalStrategy, RetrievedData, VisualizationOutcome,
};
use crate::viz::VisualizationBuilder;
use std::sync::Arc;
use tracing::{error, info};

/// Phrases recognizing the coverage-information intent
const COVERAGE_INFO_PHRASES: &[&str] = &[
    "what data",
    "data coverage",
    "ocean regions",
    "available data",
    "what oceans",
];

/// Tokens that trigger visualization payload generation
const VISUALIZATION_TOKENS: &[&str] = &[
    "map",
    "coordinates",
    "visualization",
    "plot",
    "geojson",
    "trajectory",
    "trajectories",
];

/// The query resolution pipeline
pub struct QueryPipeline {
    classifier: QueryClassifier,
    validator: GeographicValidator,
    coordinator: RetrievalCoordinator,
    shaper: ResponseShaper,
    gateway: Arc<dyn LanguageModel>,
    store: Arc<dyn RelationalStore>,
    vector: Arc<dyn VectorStore>,
    default_max_results: usize,
}

impl QueryPipeline {
    pub fn new(
        store: Arc<dyn RelationalStore>,
        vector: Arc<dyn VectorStore>,
        gateway: Arc<dyn LanguageModel>,
        settings: &Settings,
    ) -> Self {
        let synthesizer = SqlSynthesizer::new(Arc::clone(&gateway));
        Self {
            classifier: QueryClassifier::new(Arc::clone(&gateway)),
            validator: GeographicValidator::new(),
            coordinator: RetrievalCoordinator::new(
                Arc::clone(&store),
                Arc::clone(&vector),
                synthesizer,
            ),
            shaper: ResponseShaper::new(Arc::clone(&gateway), Arc::clone(&store)),
            gateway,
            store,
            vector,
            default_max_results: settings.max_search_results,
        }
    }

    /// Resolve one query. Never errors: any internal failure produces an
    /// error-shaped result.
    pub async fn process_query(&self, user_query: &str, max_results: Option<usize>) -> QueryResult {
        let max_results = max_results.unwrap_or(self.default_max_results);
        info!(query = %user_query, "Starting query resolution pipeline");

        match self.run(user_query, max_results).await {
            Ok(result) => {
                info!(
                    query_type = %result.metadata.query_type,
                    total_results = result.metadata.total_results,
                    "Pipeline completed"
                );
                result
            }
            Err(e) => {
                error!(query = %user_query, error = %e, "Pipeline failed");
                QueryResult::error(user_query, &e.to_string())
            }
        }
    }

    async fn run(&self, user_query: &str, max_results: usize) -> anyhow::Result<QueryResult> {
        let mut classification = self.classifier.classify(user_query).await;

        // Coverage-information intent answers from the catalog directly.
        let query_lower = user_query.to_lowercase();
        if COVERAGE_INFO_PHRASES.iter().any(|p| query_lower.contains(p)) {
            return Ok(self.coverage_info_result(user_query, classification).await);
        }

        // Refuse regions the store cannot serve before touching retrieval.
        let validation = self.validator.validate(user_query);
        if !validation.is_valid {
            info!(
                unavailable = ?validation.unavailable_regions,
                "Query refused: outside geographic coverage"
            );
            return Ok(short_circuit_result(
                user_query,
                classification,
                validation.message,
            ));
        }

        // Data-bearing queries always retrieve through SQL; vector-only
        // answers for these proved too easy to hallucinate from.
        if is_data_query(user_query) {
            classification.strategy = RetrievalStrategy::Sql;
            classification.confidence = 1.0;
            classification.reasoning =
                "Forced SQL retrieval for data query to prevent hallucination".to_string();
        }

        let retrieved = self
            .coordinator
            .retrieve(user_query, &classification, max_results)
            .await;

        let answer = self
            .shaper
            .shape(user_query, &classification, &retrieved)
            .await;

        let visualization = if self.wants_visualization(&query_lower, &retrieved) {
            let builder = VisualizationBuilder::new(self.gateway.as_ref());
            match builder.build(&retrieved.sql_rows, &retrieved.vector_hits).await {
                Ok(payload) => Some(VisualizationOutcome::Payload(payload)),
                Err(e) => {
                    error!(error = %e, "Visualization generation failed");
                    Some(VisualizationOutcome::Error {
                        error: e.to_string(),
                    })
                }
            }
        } else {
            None
        };

        let metadata = ResultMetadata {
            query_type: classification.strategy,
            confidence: classification.confidence,
            data_sources_used: retrieved.data_sources(),
            total_results: retrieved.total_results(),
        };

        Ok(QueryResult {
            success: true,
            query: user_query.to_string(),
            classification,
            retrieved_data: retrieved,
            answer,
            visualization,
            metadata,
        })
    }

    fn wants_visualization(&self, query_lower: &str, retrieved: &RetrievedData) -> bool {
        VISUALIZATION_TOKENS.iter().any(|t| query_lower.contains(t))
            || (retrieved.generation_method == Some(GenerationMethod::YearComparisonDirect)
                && !retrieved.sql_rows.is_empty())
    }

    async fn coverage_info_result(
        &self,
        user_query: &str,
        classification: QueryClassification,
    ) -> QueryResult {
        let mut answer = self.validator.coverage_description();
        if let Ok(stats) = self.store.stats().await {
            answer = format!(
                "Our ARGO float database contains {} profiles. {answer}",
                crate::response::format::thousands(stats.total_profiles)
            );
        }
        short_circuit_result(user_query, classification, answer)
    }

    /// Probe all three backends.
    pub async fn health_check(&self) -> HealthReport {
        let relational_ok = self.store.ping().await;
        let vector_ok = self
            .vector
            .document_count()
            .await
            .map(|count| count > 0)
            .unwrap_or(false);
        let llm_ok = self
            .gateway
            .generate(
                &LlmRequest::new(vec![
                    ChatMessage::system("Reply with the single word: ok"),
                    ChatMessage::user("health probe"),
                ])
                .with_max_tokens(8),
            )
            .await
            .is_ok();

        HealthReport {
            relational_ok,
            vector_ok,
            llm_ok,
            overall_ok: relational_ok && vector_ok && llm_ok,
        }
    }
}

/// Successful-shape result with an explanatory answer and empty retrieval.
fn short_circuit_result(
    user_query: &str,
    classification: QueryClassification,
    answer: String,
) -> QueryResult {
    let metadata = ResultMetadata {
        query_type: classification.strategy,
        confidence: classification.confidence,
        data_sources_used: Vec::new(),
        total_results: 0,
    };
    QueryResult {
        success: true,
        query: user_query.to_string(),
        classification,
        retrieved_data: RetrievedData::default(),
        answer,
        visualization: None,
        metadata,
    }
}
