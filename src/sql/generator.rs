//! LLM-backed SQL generation with safe fallbacks
//!
//! Used only when no direct shape matched. The output is cleaned,
//! rewritten, and validated; any failure substitutes a safe statement and
//! records the cause.

use super::{postprocess, validate};
use crate::error::SqlGenerationError;
use crate::llm::{prompts, ChatMessage, LanguageModel, LlmRequest};
use crate::types::{GenerationMethod, SqlSynthesis};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{error, info};

/// Generate a statement for an unrecognized query shape.
pub async fn generate_with_llm(
    gateway: &dyn LanguageModel,
    user_query: &str,
) -> Result<SqlSynthesis, SqlGenerationError> {
    let request = LlmRequest::new(vec![
        ChatMessage::system(prompts::sql_generation_system_prompt()),
        ChatMessage::user(format!("Generate SQL for: {user_query}")),
    ])
    .with_temperature(0.1);

    let response = gateway.generate(&request).await?;

    let sql = postprocess::clean_response(&response);
    let sql = postprocess::fix_array_aggregation(&sql);
    let sql = postprocess::fix_table_selection(&sql, user_query);

    validate::validate(&sql).map_err(SqlGenerationError::Invalid)?;

    info!(sql = %sql, "LLM-generated SQL validated");
    Ok(SqlSynthesis {
        sql,
        explanation: format!("Generated SQL to answer: {user_query}"),
        estimated_results: "Variable based on query".to_string(),
        parameters_used: Vec::new(),
        method: GenerationMethod::IntelligentLlm,
        count_sql: None,
        error: None,
    })
}

/// Coordinate-flavored wording that selects the geographic fallback.
fn looks_geographic(query: &str) -> bool {
    static COORD_TOKEN: OnceLock<Regex> = OnceLock::new();
    let coord_rx = COORD_TOKEN.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"\d+[°\s]*[NS]").expect("invalid coordinate token pattern")
    });
    let q = query.to_lowercase();
    q.contains("coordinate") || q.contains("near") || coord_rx.is_match(query)
}

/// Safe substitute statement after a generation or validation failure.
pub fn fallback(user_query: &str, cause: &SqlGenerationError) -> SqlSynthesis {
    error!(error = %cause, query = %user_query, "SQL generation failed, substituting fallback");

    if looks_geographic(user_query) {
        SqlSynthesis {
            sql: "SELECT COUNT(*) FROM argo_profiles WHERE latitude IS NOT NULL AND longitude IS NOT NULL"
                .to_string(),
            explanation: format!("Fallback geographic query for: {user_query}"),
            estimated_results: "Count of profiles with coordinates".to_string(),
            parameters_used: vec!["latitude".to_string(), "longitude".to_string()],
            method: GenerationMethod::Fallback,
            count_sql: None,
            error: Some(cause.to_string()),
        }
    } else {
        SqlSynthesis {
            sql: "SELECT COUNT(*) FROM argo_profiles LIMIT 10".to_string(),
            explanation: format!("Fallback query due to generation error: {cause}"),
            estimated_results: "10 profiles".to_string(),
            parameters_used: Vec::new(),
            method: GenerationMethod::Fallback,
            count_sql: None,
            error: Some(cause.to_string()),
        }
    }
}

/// Oceanographic parameter columns mentioned in the statement text.
pub fn parameters_in_sql(sql: &str) -> Vec<String> {
    let sql_lower = sql.to_lowercase();
    crate::catalog::array_columns()
        .iter()
        .filter(|col| sql_lower.contains(*col))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geographic_fallback_selection() {
        let cause = SqlGenerationError::Invalid("test".to_string());
        let s = fallback("profiles near 15°N", &cause);
        assert!(s.sql.contains("latitude IS NOT NULL"));
        assert_eq!(s.method, GenerationMethod::Fallback);
        assert!(s.error.is_some());
    }

    #[test]
    fn test_generic_fallback_selection() {
        let cause = SqlGenerationError::Invalid("test".to_string());
        let s = fallback("something unusual", &cause);
        assert_eq!(s.sql, "SELECT COUNT(*) FROM argo_profiles LIMIT 10");
    }

    #[test]
    fn test_parameters_in_sql() {
        let params = parameters_in_sql("SELECT temperature[1], salinity[1] FROM argo_profiles");
        assert!(params.contains(&"temperature".to_string()));
        assert!(params.contains(&"salinity".to_string()));
        assert!(!params.contains(&"nitrate".to_string()));
    }
}
