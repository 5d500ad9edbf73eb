//! Entity extraction from query text
//!
//! Regex and keyword rules that pull oceanographic parameters, regions,
//! dates, identifiers, and numeric comparators out of a free-form query.
//! Extraction is best-effort; an empty entity set is a valid outcome.

use crate::catalog;
use crate::types::ExtractedEntities;
use regex::Regex;

/// Compiled extraction rules
pub struct EntityExtractor {
    profile_id: Regex,
    float_id: Regex,
    standalone_id: Regex,
    location_patterns: Vec<Regex>,
    date_patterns: Vec<Regex>,
    comparator: Regex,
}

impl EntityExtractor {
    pub fn new() -> Self {
        // All patterns are literals; a failure is a build bug.
        #[allow(clippy::expect_used)]
        let rx = |pattern: &str| Regex::new(pattern).expect("invalid extraction pattern");

        Self {
            profile_id: rx(r"\b(?:profile|profile\s+number)\s+(\d{7})\b"),
            float_id: rx(r"\b(?:argo\s+)?float(?:\s+id)?\s+(\d+)\b"),
            standalone_id: rx(r"\b(\d{7})\b"),
            location_patterns: vec![
                rx(r"near\s+(?:the\s+)?equator"),
                rx(r"in\s+the\s+(\w+\s+\w+|\w+)\s+(?:ocean|sea)"),
                rx(r"(?i)around\s+(\d+\.?\d*)[°\s]*[NS]\s*,?\s*(\d+\.?\d*)[°\s]*[EW]"),
                rx(r"(?i)(\d+\.?\d*)[°\s]*[NS]\s*,?\s*(\d+\.?\d*)[°\s]*[EW]"),
                rx(r"(\d+\.?\d*)\s*degrees?\s*(?:north|south)\s*,?\s*(\d+\.?\d*)\s*degrees?\s*(?:east|west)"),
                rx(r"latitude\s+(\d+\.?\d*)"),
                rx(r"longitude\s+(\d+\.?\d*)"),
            ],
            date_patterns: vec![
                rx(r"in\s+([a-z]+\s+\d{4})"),
                rx(r"\b(\d{4}-\d{1,2}-\d{1,2})\b"),
                rx(r"(?:last|past)\s+(\d+)\s+(days?|weeks?|months?|years?)"),
                rx(r"since\s+([a-z]+\s+\d{4}|\d{4})"),
                rx(r"between\s+([a-z]*\s*\d{4})\s+and\s+([a-z]*\s*\d{4})"),
            ],
            comparator: rx(r"([><=]+)\s*(\d+\.?\d*)"),
        }
    }

    /// Run every rule against the query; all matches accumulate.
    pub fn extract(&self, query: &str) -> ExtractedEntities {
        let query_lower = query.to_lowercase();
        let mut entities = ExtractedEntities::default();

        // Explicit "profile NNNNNNN" / "float NNNN" references come first;
        // a standalone 7-digit run is only considered when neither matched.
        for cap in self.profile_id.captures_iter(&query_lower) {
            push_unique(&mut entities.profile_ids, cap[1].to_string());
        }
        for cap in self.float_id.captures_iter(&query_lower) {
            push_unique(&mut entities.float_ids, cap[1].to_string());
        }
        if entities.profile_ids.is_empty() && entities.float_ids.is_empty() {
            for cap in self.standalone_id.captures_iter(&query_lower) {
                let id = cap[1].to_string();
                if query_lower.contains("profile") {
                    push_unique(&mut entities.profile_ids, id);
                } else {
                    push_unique(&mut entities.float_ids, id);
                }
            }
        }

        for param in catalog::parameters() {
            if param.aliases.is_match(&query_lower) {
                push_unique(&mut entities.parameters, param.name.to_string());
            }
        }

        for region in catalog::regions() {
            if region.keywords.iter().any(|k| query_lower.contains(k)) {
                push_unique(&mut entities.regions, region.name.to_string());
            }
        }

        for pattern in &self.location_patterns {
            for cap in pattern.captures_iter(&query_lower) {
                let text = match cap.len() {
                    1 => cap[0].to_string(),
                    _ => cap
                        .iter()
                        .skip(1)
                        .flatten()
                        .map(|m| m.as_str())
                        .collect::<Vec<_>>()
                        .join(" "),
                };
                push_unique(&mut entities.locations, text);
            }
        }

        for pattern in &self.date_patterns {
            for cap in pattern.captures_iter(&query_lower) {
                let text = cap
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let text = if text.is_empty() {
                    cap[0].to_string()
                } else {
                    text
                };
                push_unique(&mut entities.dates, text.trim().to_string());
            }
        }

        for cap in self.comparator.captures_iter(&query_lower) {
            if let Ok(value) = cap[2].parse::<f64>() {
                let pair = (cap[1].to_string(), value);
                if !entities.comparators.contains(&pair) {
                    entities.comparators.push(pair);
                }
            }
        }

        entities
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn push_unique(target: &mut Vec<String>, value: String) {
    if !target.contains(&value) {
        target.push(value);
    }
}
