//! Query classification types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which retrieval strategy a query should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrievalStrategy {
    #[serde(rename = "sql_retrieval")]
    Sql,
    #[serde(rename = "vector_retrieval")]
    Vector,
    #[serde(rename = "hybrid_retrieval")]
    Hybrid,
}

impl fmt::Display for RetrievalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalStrategy::Sql => write!(f, "sql_retrieval"),
            RetrievalStrategy::Vector => write!(f, "vector_retrieval"),
            RetrievalStrategy::Hybrid => write!(f, "hybrid_retrieval"),
        }
    }
}

/// Entities pulled out of the query text by regex rules and/or the LLM
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub float_ids: Vec<String>,
    #[serde(default)]
    pub profile_ids: Vec<String>,
    /// Numeric comparators as (operator, value) pairs, e.g. (">", 5.0)
    #[serde(default)]
    pub comparators: Vec<(String, f64)>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
            && self.regions.is_empty()
            && self.locations.is_empty()
            && self.dates.is_empty()
            && self.float_ids.is_empty()
            && self.profile_ids.is_empty()
            && self.comparators.is_empty()
    }

    /// Union with another entity set, preserving first-seen order.
    pub fn merge(&mut self, other: &ExtractedEntities) {
        fn extend_unique(target: &mut Vec<String>, source: &[String]) {
            for item in source {
                if !target.contains(item) {
                    target.push(item.clone());
                }
            }
        }
        extend_unique(&mut self.parameters, &other.parameters);
        extend_unique(&mut self.regions, &other.regions);
        extend_unique(&mut self.locations, &other.locations);
        extend_unique(&mut self.dates, &other.dates);
        extend_unique(&mut self.float_ids, &other.float_ids);
        extend_unique(&mut self.profile_ids, &other.profile_ids);
        for pair in &other.comparators {
            if !self.comparators.contains(pair) {
                self.comparators.push(pair.clone());
            }
        }
    }
}

/// The classifier's routing decision
#[derive(Debug, Clone, Serialize)]
pub struct QueryClassification {
    pub strategy: RetrievalStrategy,
    /// In [0, 1]
    pub confidence: f64,
    pub reasoning: String,
    pub entities: ExtractedEntities,
    /// Hints for the user on how to sharpen the query
    pub suggestions: Vec<String>,
}

impl QueryClassification {
    /// Low-confidence vector fallback used when classification fails.
    pub fn fallback(reasoning: impl Into<String>) -> Self {
        Self {
            strategy: RetrievalStrategy::Vector,
            confidence: 0.3,
            reasoning: reasoning.into(),
            entities: ExtractedEntities::default(),
            suggestions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_preserves_first_seen_order() {
        let mut a = ExtractedEntities {
            parameters: vec!["temperature".into()],
            ..Default::default()
        };
        let b = ExtractedEntities {
            parameters: vec!["salinity".into(), "temperature".into()],
            float_ids: vec!["1902681".into()],
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.parameters, vec!["temperature", "salinity"]);
        assert_eq!(a.float_ids, vec!["1902681"]);
    }

    #[test]
    fn test_strategy_wire_names() {
        let json = serde_json::to_string(&RetrievalStrategy::Sql).expect("serialize");
        assert_eq!(json, "\"sql_retrieval\"");
        let parsed: RetrievalStrategy =
            serde_json::from_str("\"hybrid_retrieval\"").expect("deserialize");
        assert_eq!(parsed, RetrievalStrategy::Hybrid);
    }
}
