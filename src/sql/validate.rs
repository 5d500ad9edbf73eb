//! SQL safety validation
//!
//! Every statement must pass here before reaching the store; a nonempty
//! `sql_rows` in a result implies its statement validated.

use crate::catalog;
use regex::Regex;
use std::sync::OnceLock;

/// SQL keywords that must never appear in a generated statement
const FORBIDDEN_KEYWORDS: &[&str] = &["drop", "delete", "insert", "update", "alter", "create"];

fn forbidden_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"(?i)\b(drop|delete|insert|update|alter|create)\b")
            .expect("invalid forbidden-keyword pattern")
    })
}

fn bare_aggregate_pattern(column: &str) -> Regex {
    #[allow(clippy::expect_used)]
    Regex::new(&format!(
        r"(?i)\b(avg|sum|min|max)\(\s*(?:[A-Za-z_][A-Za-z0-9_]*\.)?{column}\s*\)"
    ))
    .expect("invalid bare-aggregate pattern")
}

/// Validate a statement against the safety rules. Returns the reason on
/// rejection.
pub fn validate(sql: &str) -> Result<(), String> {
    let sql_lower = sql.trim().to_lowercase();

    // UNION templates open with a parenthesized SELECT block.
    if !sql_lower.trim_start_matches('(').trim_start().starts_with("select") {
        return Err("statement must start with SELECT".to_string());
    }

    if !sql_lower.contains("from") {
        return Err("statement has no FROM clause".to_string());
    }

    if !sql_lower.contains(catalog::TABLE_PROFILES) && !sql_lower.contains(catalog::TABLE_FLOATS) {
        return Err("statement references no known table".to_string());
    }

    if let Some(m) = forbidden_pattern().find(&sql_lower) {
        return Err(format!("forbidden keyword: {}", m.as_str()));
    }

    for column in catalog::array_columns() {
        if bare_aggregate_pattern(column).is_match(&sql_lower) {
            return Err(format!("bare aggregate over array column {column}"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_select() {
        assert!(validate("SELECT COUNT(*) FROM argo_profiles").is_ok());
        assert!(validate("SELECT float_id FROM argo_floats WHERE status = 'ACTIVE'").is_ok());
    }

    #[test]
    fn test_accepts_parenthesized_union_blocks() {
        let sql = "(SELECT 1 FROM argo_profiles) UNION ALL (SELECT 2 FROM argo_profiles)";
        assert!(validate(sql).is_ok());
    }

    #[test]
    fn test_rejects_non_select() {
        assert!(validate("UPDATE argo_profiles SET latitude = 0").is_err());
        assert!(validate("WITH x AS (SELECT 1) SELECT * FROM argo_profiles").is_err());
    }

    #[test]
    fn test_rejects_missing_from() {
        assert!(validate("SELECT 1").is_err());
    }

    #[test]
    fn test_rejects_unknown_table() {
        assert!(validate("SELECT * FROM pg_tables").is_err());
    }

    #[test]
    fn test_rejects_forbidden_keywords() {
        let err = validate("SELECT * FROM argo_profiles; DROP TABLE argo_profiles")
            .expect_err("should reject");
        assert!(err.contains("drop"));
        assert!(validate("SELECT * FROM argo_profiles WHERE 1=1; delete from argo_floats").is_err());
    }

    #[test]
    fn test_forbidden_keywords_are_word_bounded() {
        // "created_at" contains "create" but is not the CREATE keyword.
        assert!(validate("SELECT created_at FROM argo_floats").is_ok());
    }

    #[test]
    fn test_rejects_bare_array_aggregate() {
        assert!(validate("SELECT AVG(temperature) FROM argo_profiles").is_err());
        assert!(validate("SELECT MAX(t.salinity) FROM argo_profiles t").is_err());
    }

    #[test]
    fn test_accepts_subscripted_aggregate() {
        assert!(validate("SELECT AVG(temperature[1]) FROM argo_profiles").is_ok());
        assert!(validate("SELECT MAX(max_pressure) FROM argo_profiles").is_ok());
    }
}
