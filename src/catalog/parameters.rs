//! Oceanographic parameter vocabulary
//!
//! Maps user-facing parameter names to database columns, with the alias
//! patterns the entity extractor matches against query text.

use regex::Regex;
use std::sync::OnceLock;

/// A recognized oceanographic parameter
#[derive(Debug)]
pub struct Parameter {
    /// Canonical name used in extracted entities, e.g. "dissolved_oxygen"
    pub name: &'static str,
    /// Database column, empty for umbrella terms like "bgc"
    pub column: &'static str,
    /// Alias pattern matched against the lowercased query
    pub aliases: Regex,
    /// Display unit, empty when dimensionless
    pub unit: &'static str,
}

static PARAMETERS: OnceLock<Vec<Parameter>> = OnceLock::new();

fn build(name: &'static str, column: &'static str, pattern: &str, unit: &'static str) -> Parameter {
    Parameter {
        name,
        column,
        // Patterns are fixed at compile time; a failure here is a build bug.
        #[allow(clippy::expect_used)]
        aliases: Regex::new(pattern).expect("invalid parameter alias pattern"),
        unit,
    }
}

/// The full parameter vocabulary, built once.
pub fn parameters() -> &'static [Parameter] {
    PARAMETERS.get_or_init(|| {
        vec![
            build("temperature", "temperature", r"temperature|temp\b|thermal", "°C"),
            build("salinity", "salinity", r"salinity|\bsalt\b|halocline", "PSU"),
            build(
                "dissolved_oxygen",
                "dissolved_oxygen",
                r"dissolved\s+oxygen|oxygen|\bo2\b",
                "μmol/kg",
            ),
            build("ph", "ph_in_situ", r"\bph\b|acidity|alkalinity", ""),
            build("nitrate", "nitrate", r"nitrate|nitrogen|\bno3\b", "μmol/kg"),
            build(
                "chlorophyll",
                "chlorophyll_a",
                r"chlorophyll|\bchl\b|phytoplankton|algae",
                "mg/m³",
            ),
            build("pressure", "pressure", r"pressure|depth|deep", "dbar"),
            build("bgc", "", r"\bbgc\b|biogeochemical|biochemical", ""),
        ]
    })
}

/// Measurement columns stored as arrays in `argo_profiles`.
///
/// A bare aggregate over any of these is invalid SQL for this schema; the
/// synthesizer rewrites them to surface-sample subscripts.
pub fn array_columns() -> &'static [&'static str] {
    &[
        "temperature",
        "salinity",
        "pressure",
        "depth",
        "dissolved_oxygen",
        "ph_in_situ",
        "nitrate",
        "chlorophyll_a",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_match() {
        let params = parameters();
        let temp = params.iter().find(|p| p.name == "temperature").expect("temperature");
        assert!(temp.aliases.is_match("show thermal structure"));
        assert!(temp.aliases.is_match("temp profiles"));

        let oxy = params.iter().find(|p| p.name == "dissolved_oxygen").expect("oxygen");
        assert!(oxy.aliases.is_match("dissolved oxygen levels"));
        assert!(oxy.aliases.is_match("o2 concentration"));
    }

    #[test]
    fn test_ph_does_not_match_inside_words() {
        let params = parameters();
        let ph = params.iter().find(|p| p.name == "ph").expect("ph");
        assert!(ph.aliases.is_match("ph levels near the surface"));
        assert!(!ph.aliases.is_match("phytoplankton bloom"));
    }

    #[test]
    fn test_every_column_is_an_array_column() {
        let arrays = array_columns();
        for p in parameters() {
            if !p.column.is_empty() {
                assert!(arrays.contains(&p.column), "{} missing", p.column);
            }
        }
    }
}
