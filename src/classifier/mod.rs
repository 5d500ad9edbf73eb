//! Query Classifier
//!
//! Fuses rule-based keyword scoring with an LLM classification into a
//! routing decision. The rule leg is deterministic and always available;
//! the LLM leg validates it and supplements entity extraction. When the
//! two disagree, the LLM wins but its confidence is capped.

use crate::extract::EntityExtractor;
use crate::llm::{prompts, ChatMessage, LanguageModel, LlmRequest};
use crate::types::{ExtractedEntities, QueryClassification, RetrievalStrategy};
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Keywords indicating structured retrieval
const SQL_KEYWORDS: &[&str] = &[
    "show", "get", "find", "retrieve", "extract", "list", "count", "filter", "where", "between",
    "greater than", "less than", "exact", "specific", "precise", "data", "values", "measurements",
];

/// Keywords indicating semantic retrieval
const VECTOR_KEYWORDS: &[&str] = &[
    "summarize", "describe", "explain", "patterns", "trends", "characteristics", "overview",
    "general", "typical", "variations", "changes", "insights", "understand",
];

/// Keywords indicating both retrievals
const HYBRID_KEYWORDS: &[&str] = &[
    "compare", "analyze", "relationship", "correlation", "impact", "influence", "effect",
    "difference", "similar", "contrast",
];

/// Imperative phrases that strongly indicate SQL
const IMPERATIVE_PHRASES: &[&str] = &["show me", "get me", "find all", "list all"];

/// The LLM's JSON reply shape
#[derive(Debug, Deserialize)]
struct LlmClassification {
    query_type: RetrievalStrategy,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    extracted_entities: ExtractedEntities,
}

/// Rule-based scoring outcome
#[derive(Debug, Clone, Copy)]
struct RuleResult {
    strategy: RetrievalStrategy,
    confidence: f64,
}

pub struct QueryClassifier {
    gateway: Arc<dyn LanguageModel>,
    extractor: EntityExtractor,
    geographic_patterns: Vec<Regex>,
    numeric: Regex,
    location_hint: Regex,
    date_hint: Regex,
}

impl QueryClassifier {
    pub fn new(gateway: Arc<dyn LanguageModel>) -> Self {
        #[allow(clippy::expect_used)]
        let rx = |pattern: &str| Regex::new(pattern).expect("invalid classifier pattern");

        Self {
            gateway,
            extractor: EntityExtractor::new(),
            geographic_patterns: vec![
                rx(r"near\s+coordinates?"),
                rx(r"coordinates?\s+\d+[°\s]*[NS]"),
                rx(r"profiles?\s+near\s+\d+"),
                rx(r"find\s+profiles?\s+near"),
                rx(r"around\s+\d+[°\s]*[NS]"),
                rx(r"latitude.*longitude"),
                rx(r"\d+[°\s]*[NS].*\d+[°\s]*[EW]"),
            ],
            numeric: rx(r"\b\d+\b"),
            location_hint: rx(
                r"near\s+(?:the\s+)?equator|arabian\s+sea|bay\s+of\s+bengal|indian\s+ocean|in\s+the\s+\w+\s+(?:ocean|sea)",
            ),
            date_hint: rx(r"\b\d{4}\b|last\s+\d+\s+(?:days?|weeks?|months?|years?)|since\s+\d{4}"),
        }
    }

    /// Classify a query. Never errors: LLM failure degrades to a
    /// low-confidence vector leg and fusion proceeds.
    pub async fn classify(&self, user_query: &str) -> QueryClassification {
        let query_lower = user_query.to_lowercase();

        // Coordinate-bearing queries skip the LLM entirely.
        if self
            .geographic_patterns
            .iter()
            .any(|p| p.is_match(&query_lower))
        {
            return QueryClassification {
                strategy: RetrievalStrategy::Sql,
                confidence: 0.95,
                reasoning: "Geographic coordinate query detected - requires SQL database query"
                    .to_string(),
                entities: self.extractor.extract(user_query),
                suggestions: Vec::new(),
            };
        }

        let rule = self.rule_based(&query_lower);
        let llm = self.llm_classification(user_query).await;

        let fused = self.fuse(user_query, rule, llm);
        info!(
            query = %user_query,
            strategy = %fused.strategy,
            confidence = fused.confidence,
            "Query classified"
        );
        fused
    }

    fn rule_based(&self, query_lower: &str) -> RuleResult {
        let count_hits =
            |keywords: &[&str]| keywords.iter().filter(|k| query_lower.contains(*k)).count();

        let mut sql_score = count_hits(SQL_KEYWORDS);
        let vector_score = count_hits(VECTOR_KEYWORDS);
        let hybrid_score = count_hits(HYBRID_KEYWORDS);

        if IMPERATIVE_PHRASES.iter().any(|p| query_lower.contains(p)) {
            sql_score += 2;
        }
        if self.numeric.is_match(query_lower) {
            sql_score += 1;
        }
        if self.location_hint.is_match(query_lower) {
            sql_score += 1;
        }
        if self.date_hint.is_match(query_lower) {
            sql_score += 1;
        }

        let max_score = sql_score.max(vector_score).max(hybrid_score);
        let confidence_for = |score: usize| (0.6 + score as f64 * 0.1).min(0.9);

        if max_score == 0 {
            RuleResult {
                strategy: RetrievalStrategy::Vector,
                confidence: 0.5,
            }
        } else if sql_score == max_score {
            RuleResult {
                strategy: RetrievalStrategy::Sql,
                confidence: confidence_for(sql_score),
            }
        } else if hybrid_score == max_score {
            RuleResult {
                strategy: RetrievalStrategy::Hybrid,
                confidence: confidence_for(hybrid_score),
            }
        } else {
            RuleResult {
                strategy: RetrievalStrategy::Vector,
                confidence: confidence_for(vector_score),
            }
        }
    }

    async fn llm_classification(&self, user_query: &str) -> LlmClassification {
        let request = LlmRequest::new(vec![
            ChatMessage::system(prompts::classification_system_prompt()),
            ChatMessage::user(format!("Classify this oceanographic query: {user_query}")),
        ])
        .with_temperature(0.1);

        match self.gateway.generate(&request).await {
            Ok(reply) => match parse_llm_classification(&reply) {
                Some(parsed) => parsed,
                None => {
                    warn!(reply = %reply, "Unparseable classification reply, defaulting to vector");
                    default_llm_classification("Failed to parse classification, defaulting to vector retrieval")
                }
            },
            Err(e) => {
                warn!(error = %e, "LLM classification failed, defaulting to vector");
                default_llm_classification("Classification failed")
            }
        }
    }

    fn fuse(
        &self,
        user_query: &str,
        rule: RuleResult,
        llm: LlmClassification,
    ) -> QueryClassification {
        let mut entities = self.extractor.extract(user_query);
        entities.merge(&llm.extracted_entities);

        let llm_confidence = llm.confidence.unwrap_or(0.5);
        let (strategy, confidence) = if rule.strategy == llm.query_type {
            (rule.strategy, rule.confidence.max(llm_confidence))
        } else {
            (llm.query_type, llm_confidence.min(0.7))
        };

        let suggestions = preprocessing_suggestions(&entities, strategy);

        QueryClassification {
            strategy,
            confidence,
            reasoning: llm
                .reasoning
                .unwrap_or_else(|| "Combined rule-based and LLM classification".to_string()),
            entities,
            suggestions,
        }
    }
}

fn default_llm_classification(reasoning: &str) -> LlmClassification {
    LlmClassification {
        query_type: RetrievalStrategy::Vector,
        confidence: Some(0.3),
        reasoning: Some(reasoning.to_string()),
        extracted_entities: ExtractedEntities::default(),
    }
}

/// Parse the LLM's JSON, tolerating fences and surrounding prose.
fn parse_llm_classification(reply: &str) -> Option<LlmClassification> {
    let cleaned = reply.replace("```json", "").replace("```", "");
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    serde_json::from_str(&cleaned[start..=end]).ok()
}

/// Hints for sharpening the query, derived from what was (not) extracted.
fn preprocessing_suggestions(
    entities: &ExtractedEntities,
    strategy: RetrievalStrategy,
) -> Vec<String> {
    let mut suggestions = Vec::new();
    match strategy {
        RetrievalStrategy::Sql => {
            if entities.parameters.is_empty() {
                suggestions.push(
                    "Consider specifying oceanographic parameters (temperature, salinity, etc.)"
                        .to_string(),
                );
            }
            if entities.locations.is_empty()
                && entities.regions.is_empty()
                && entities.dates.is_empty()
            {
                suggestions.push(
                    "Adding location or date constraints will improve query performance"
                        .to_string(),
                );
            }
        }
        RetrievalStrategy::Vector => {
            if entities.parameters.len() > 3 {
                suggestions.push(
                    "Consider breaking down into simpler questions for better semantic search"
                        .to_string(),
                );
            }
        }
        RetrievalStrategy::Hybrid => {
            suggestions
                .push("This complex query will use both structured and semantic search".to_string());
        }
    }
    suggestions
}
