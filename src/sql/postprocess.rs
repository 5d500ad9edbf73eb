//! LLM SQL post-processing
//!
//! The LLM's raw output is cleaned and rewritten before validation. The
//! array-aggregate rewrite enforces the schema convention that a bare
//! aggregate over a measurement array means the surface (first) sample.

use crate::catalog;
use regex::Regex;

/// Strip code fences and comment lines, collapse to a single statement.
pub fn clean_response(response: &str) -> String {
    let mut text = response.to_string();
    for fence in ["```sql", "```SQL", "```"] {
        text = text.replace(fence, "");
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("--"))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .trim_end_matches(';')
        .to_string()
}

/// Rewrite `AVG(temperature)` to `AVG(temperature[1])` (and the same for
/// SUM/MIN/MAX, including table-qualified forms) for every array column.
pub fn fix_array_aggregation(sql: &str) -> String {
    let mut fixed = sql.to_string();
    for column in catalog::array_columns() {
        for func in ["avg", "sum", "min", "max"] {
            // Qualified alias first (AVG(T1.temperature)), then the bare form.
            #[allow(clippy::expect_used)]
            let qualified = Regex::new(&format!(r"(?i)\b{func}\(\s*([A-Za-z_][A-Za-z0-9_]*)\.{column}\s*\)"))
                .expect("invalid aggregate rewrite pattern");
            fixed = qualified
                .replace_all(&fixed, format!("{}($1.{column}[1])", func.to_uppercase()))
                .into_owned();

            #[allow(clippy::expect_used)]
            let bare = Regex::new(&format!(r"(?i)\b{func}\(\s*{column}\s*\)"))
                .expect("invalid aggregate rewrite pattern");
            fixed = bare
                .replace_all(&fixed, format!("{}({column}[1])", func.to_uppercase()))
                .into_owned();
        }
    }
    fixed
}

/// Location keywords that mean the query is about profile positions, not
/// float deployment metadata
const LOCATION_KEYWORDS: &[&str] = &[
    "location",
    "coordinate",
    "latitude",
    "longitude",
    "equator",
    "near",
    "trajectory",
    "trajectories",
];

/// Location queries must read `argo_profiles`; if the LLM selected
/// `argo_floats`, retarget the FROM clause and widen the projection.
pub fn fix_table_selection(sql: &str, user_query: &str) -> String {
    let query_lower = user_query.to_lowercase();
    let is_location_query = LOCATION_KEYWORDS.iter().any(|kw| query_lower.contains(kw));
    if !is_location_query || !sql.to_lowercase().contains("from argo_floats") {
        return sql.to_string();
    }

    #[allow(clippy::expect_used)]
    let from_rx = Regex::new(r"(?i)\bFROM\s+argo_floats\b").expect("invalid FROM pattern");
    let mut fixed = from_rx.replace_all(sql, "FROM argo_profiles").into_owned();
    fixed = fixed.replace(
        "SELECT float_id, latitude, longitude",
        "SELECT profile_id, float_id, latitude, longitude, profile_date",
    );
    tracing::info!("Retargeted location query from argo_floats to argo_profiles");
    fixed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_fences_and_comments() {
        let raw = "```sql\n-- profiles per year\nSELECT COUNT(*)\nFROM argo_profiles;\n```";
        assert_eq!(clean_response(raw), "SELECT COUNT(*) FROM argo_profiles");
    }

    #[test]
    fn test_fix_bare_aggregate() {
        let sql = "SELECT AVG(temperature) FROM argo_profiles";
        let fixed = fix_array_aggregation(sql);
        assert!(fixed.contains("AVG(temperature[1])"));
        assert!(!fixed.contains("AVG(temperature)"));
    }

    #[test]
    fn test_fix_qualified_aggregate() {
        let sql = "SELECT AVG(T1.temperature) FROM argo_profiles AS T1";
        let fixed = fix_array_aggregation(sql);
        assert!(fixed.contains("AVG(T1.temperature[1])"));
    }

    #[test]
    fn test_fix_all_aggregate_functions() {
        let sql = "SELECT MIN(salinity), MAX(salinity), SUM(pressure) FROM argo_profiles";
        let fixed = fix_array_aggregation(sql);
        assert!(fixed.contains("MIN(salinity[1])"));
        assert!(fixed.contains("MAX(salinity[1])"));
        assert!(fixed.contains("SUM(pressure[1])"));
    }

    #[test]
    fn test_subscripted_aggregate_untouched() {
        let sql = "SELECT AVG(temperature[1]) FROM argo_profiles";
        assert_eq!(fix_array_aggregation(sql), sql);
    }

    #[test]
    fn test_scalar_aggregate_untouched() {
        let sql = "SELECT MAX(max_pressure) FROM argo_profiles";
        assert_eq!(fix_array_aggregation(sql), sql);
    }

    #[test]
    fn test_table_retarget_for_location_query() {
        let sql = "SELECT float_id, latitude, longitude FROM argo_floats";
        let fixed = fix_table_selection(sql, "show float locations on a map");
        assert!(fixed.contains("FROM argo_profiles"));
        assert!(fixed.contains("profile_id, float_id, latitude, longitude, profile_date"));
    }

    #[test]
    fn test_table_untouched_for_metadata_query() {
        let sql = "SELECT institution, COUNT(*) FROM argo_floats GROUP BY institution";
        assert_eq!(fix_table_selection(sql, "which institutions operate floats"), sql);
    }
}
