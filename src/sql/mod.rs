//! SQL Synthesizer
//!
//! Turns a natural-language query into a validated SQL statement. A closed
//! set of direct shapes bypasses the LLM entirely; each encodes a fix for a
//! query class the LLM repeatedly got wrong. Everything else goes through
//! schema-constrained LLM generation with post-processing and validation.

pub mod generator;
pub mod postprocess;
pub mod shapes;
pub mod validate;

pub use shapes::{
    is_geographic_query, is_nearest_floats_query, is_operating_duration_query,
    is_year_comparison_query, is_year_count_query, mentions_equator, parse_coordinates,
    CoordinatePair, NEAREST_LIMIT, NEAREST_RADIUS_KM,
};

use crate::llm::LanguageModel;
use crate::types::SqlSynthesis;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::info;

/// Window applied to unbounded non-COUNT statements
const DEFAULT_LIMIT: u32 = 25;

/// The synthesizer facade: direct shapes first, LLM otherwise
pub struct SqlSynthesizer {
    gateway: Arc<dyn LanguageModel>,
}

impl SqlSynthesizer {
    pub fn new(gateway: Arc<dyn LanguageModel>) -> Self {
        Self { gateway }
    }

    /// Produce a validated statement for the query. Never errors: failures
    /// substitute a safe fallback with the cause recorded.
    pub async fn synthesize(&self, user_query: &str) -> SqlSynthesis {
        let direct = shapes::operating_duration(user_query)
            .or_else(|| shapes::year_count(user_query))
            .or_else(|| shapes::nearest_floats(user_query))
            .or_else(|| shapes::year_comparison(user_query))
            .or_else(|| shapes::geographic(user_query));

        let mut synthesis = match direct {
            Some(synthesis) => {
                info!(method = %synthesis.method, "Direct SQL shape matched");
                synthesis
            }
            None => match generator::generate_with_llm(self.gateway.as_ref(), user_query).await {
                Ok(mut synthesis) => {
                    synthesis.parameters_used = generator::parameters_in_sql(&synthesis.sql);
                    synthesis
                }
                Err(cause) => generator::fallback(user_query, &cause),
            },
        };

        synthesis.sql = ensure_limit(&synthesis.sql, synthesis.method.has_builtin_limit());
        synthesis.count_sql = derive_count_query(&synthesis.sql);
        synthesis
    }
}

/// Append `LIMIT 25` to unbounded non-COUNT statements. Direct templates
/// with their own LIMIT pass through untouched.
fn ensure_limit(sql: &str, has_builtin_limit: bool) -> String {
    let sql_lower = sql.to_lowercase();
    if has_builtin_limit || sql_lower.contains("count(") || sql_lower.contains("limit") {
        return sql.to_string();
    }
    format!("{sql} LIMIT {DEFAULT_LIMIT}")
}

/// Derive the companion COUNT statement: strip LIMIT and ORDER BY, keep
/// the WHERE clause. GROUP BY statements count the base table under the
/// same filter instead of the groups.
pub fn derive_count_query(sql: &str) -> Option<String> {
    static LIMIT_RX: OnceLock<Regex> = OnceLock::new();
    static ORDER_RX: OnceLock<Regex> = OnceLock::new();
    static FROM_RX: OnceLock<Regex> = OnceLock::new();
    static WHERE_RX: OnceLock<Regex> = OnceLock::new();
    static SELECT_RX: OnceLock<Regex> = OnceLock::new();

    #[allow(clippy::expect_used)]
    let limit_rx = LIMIT_RX.get_or_init(|| Regex::new(r"(?i)\s+LIMIT\s+\d+").expect("pattern"));
    #[allow(clippy::expect_used)]
    let order_rx =
        ORDER_RX.get_or_init(|| Regex::new(r"(?is)\s+ORDER\s+BY\s+.*$").expect("pattern"));
    #[allow(clippy::expect_used)]
    let from_rx = FROM_RX.get_or_init(|| Regex::new(r"(?i)FROM\s+(\w+)").expect("pattern"));
    #[allow(clippy::expect_used)]
    let where_rx = WHERE_RX.get_or_init(|| {
        Regex::new(r"(?is)WHERE\s+(.+?)(?:\s+GROUP\s+BY|\s+ORDER\s+BY|$)").expect("pattern")
    });
    #[allow(clippy::expect_used)]
    let select_rx =
        SELECT_RX.get_or_init(|| Regex::new(r"(?is)SELECT\s+.*?\s+FROM").expect("pattern"));

    // UNION statements have no single base filter worth counting.
    if sql.to_lowercase().contains("union") {
        return None;
    }

    let stripped = limit_rx.replace_all(sql, "");
    let stripped = order_rx.replace_all(&stripped, "");

    if stripped.to_lowercase().contains("group by") {
        let table = from_rx.captures(&stripped)?.get(1)?.as_str().to_string();
        match where_rx.captures(&stripped) {
            Some(caps) => {
                let where_clause = caps.get(1)?.as_str().trim().to_string();
                Some(format!(
                    "SELECT COUNT(*) as count FROM {table} WHERE {where_clause}"
                ))
            }
            None => Some(format!("SELECT COUNT(*) as count FROM {table}")),
        }
    } else {
        let counted = select_rx.replace(&stripped, "SELECT COUNT(*) as count FROM");
        Some(counted.trim().to_string())
    }
}
