//! Geographic coverage validation
//!
//! Refuses queries about ocean regions the store has no data for, before
//! any retrieval happens. A clear refusal beats a hallucinated answer
//! synthesized from unrelated records.

use crate::catalog;

/// Validation outcome
#[derive(Debug, Clone)]
pub struct CoverageValidation {
    pub is_valid: bool,
    /// Refusal message naming the available regions; empty when valid
    pub message: String,
    pub unavailable_regions: Vec<String>,
    pub available_regions: Vec<String>,
}

/// Stateless validator over the static region catalog
pub struct GeographicValidator;

impl GeographicValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check whether the query mentions a region outside data coverage.
    /// Queries naming supported regions, or no region at all, pass.
    pub fn validate(&self, user_query: &str) -> CoverageValidation {
        let query_lower = user_query.to_lowercase();
        let available: Vec<String> = catalog::regions()
            .iter()
            .map(|r| r.name.to_string())
            .collect();

        let mentioned_unavailable: Vec<String> = catalog::unsupported_regions()
            .iter()
            .filter(|region| region.keywords.iter().any(|k| query_lower.contains(k)))
            .map(|region| region.name.to_string())
            .collect();

        if mentioned_unavailable.is_empty() {
            return CoverageValidation {
                is_valid: true,
                message: String::new(),
                unavailable_regions: Vec::new(),
                available_regions: available,
            };
        }

        let message = format!(
            "I don't have data for the {}. Our ARGO float database covers the {}. \
             Available regions: {}. Please ask about one of these regions instead.",
            mentioned_unavailable.join(", "),
            catalog::coverage().description,
            available.join(", ")
        );

        CoverageValidation {
            is_valid: false,
            message,
            unavailable_regions: mentioned_unavailable,
            available_regions: available,
        }
    }

    /// Human description of the store's coverage for the coverage-info
    /// intent.
    pub fn coverage_description(&self) -> String {
        let cov = catalog::coverage();
        let unavailable: Vec<&str> = catalog::unsupported_regions()
            .iter()
            .map(|r| r.name)
            .collect();
        format!(
            "Our ARGO float database contains profiles from the {}. \
             Longitude range: {}°E to {}°E, Latitude range: {}°S to {}°N. \
             We do not have data for the {}.",
            cov.description,
            cov.bounds.lon_min,
            cov.bounds.lon_max,
            cov.bounds.lat_min.abs(),
            cov.bounds.lat_max,
            unavailable.join(", ")
        )
    }
}

impl Default for GeographicValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_region_refused() {
        let v = GeographicValidator::new();
        let result = v.validate("What is the temperature in the Atlantic Ocean?");
        assert!(!result.is_valid);
        assert!(result.unavailable_regions.contains(&"Atlantic Ocean".to_string()));
        assert!(result.message.contains("Indian Ocean"));
    }

    #[test]
    fn test_supported_region_passes() {
        let v = GeographicValidator::new();
        assert!(v.validate("salinity in the Bay of Bengal").is_valid);
        assert!(v.validate("temperature near the equator").is_valid);
    }

    #[test]
    fn test_no_region_mention_passes() {
        let v = GeographicValidator::new();
        assert!(v.validate("how many profiles in 2023").is_valid);
    }

    #[test]
    fn test_coverage_description_names_gaps() {
        let v = GeographicValidator::new();
        let description = v.coverage_description();
        assert!(description.contains("Indian Ocean"));
        assert!(description.contains("Atlantic Ocean"));
        assert!(description.contains("Pacific Ocean"));
    }
}
