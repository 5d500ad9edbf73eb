//! Direct query shapes
//!
//! A closed set of query shapes for which the synthesizer emits a
//! deterministic SQL template instead of calling the LLM. Each shape is a
//! named predicate + builder pair so triggers stay individually testable.

use crate::types::{GenerationMethod, SqlSynthesis};
use regex::Regex;
use std::sync::OnceLock;

/// Nearest-floats search radius
pub const NEAREST_RADIUS_KM: f64 = 500.0;
/// Nearest-floats result cap
pub const NEAREST_LIMIT: u32 = 10;
/// Mean Earth radius for the Haversine distance
pub const EARTH_RADIUS_KM: f64 = 6371.0;

fn regex(pattern: &str) -> Regex {
    // Shape patterns are fixed at compile time.
    #[allow(clippy::expect_used)]
    Regex::new(pattern).expect("invalid shape pattern")
}

/// A parsed decimal coordinate pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatePair {
    pub latitude: f64,
    pub longitude: f64,
}

/// Parse the first `<num>°[NS], <num>°[EW]` pattern (or the spelled-out
/// `degrees north/east` form) into signed decimal degrees.
pub fn parse_coordinates(query: &str) -> Option<CoordinatePair> {
    static SYMBOL: OnceLock<Regex> = OnceLock::new();
    static SPELLED: OnceLock<Regex> = OnceLock::new();
    let symbol = SYMBOL.get_or_init(|| {
        regex(r"(?i)(\d+(?:\.\d+)?)[°\s]*([NS])\s*,?\s*(\d+(?:\.\d+)?)[°\s]*([EW])")
    });
    let spelled = SPELLED.get_or_init(|| {
        regex(r"(?i)(\d+(?:\.\d+)?)\s*degrees?\s*(north|south)\s*,?\s*(\d+(?:\.\d+)?)\s*degrees?\s*(east|west)")
    });

    let caps = symbol.captures(query).or_else(|| spelled.captures(query))?;
    let lat_val: f64 = caps[1].parse().ok()?;
    let lon_val: f64 = caps[3].parse().ok()?;
    let lat_north = caps[2].to_lowercase().starts_with('n');
    let lon_east = caps[4].to_lowercase().starts_with('e');
    Some(CoordinatePair {
        latitude: if lat_north { lat_val } else { -lat_val },
        longitude: if lon_east { lon_val } else { -lon_val },
    })
}

// ─── operating_duration_direct ────────────────────────────────────────────────

/// "floats operating for more than 3 years" and friends.
pub fn is_operating_duration_query(query: &str) -> bool {
    let q = query.to_lowercase();
    ["operating for", "been operating", "operating more than", "operating less than"]
        .iter()
        .any(|phrase| q.contains(phrase))
}

pub fn operating_duration(query: &str) -> Option<SqlSynthesis> {
    if !is_operating_duration_query(query) {
        return None;
    }
    static YEARS: OnceLock<Regex> = OnceLock::new();
    let years_rx = YEARS.get_or_init(|| regex(r"(\d+)\s*years?"));

    let q = query.to_lowercase();
    let years: u32 = years_rx.captures(&q)?.get(1)?.as_str().parse().ok()?;

    let comparison = if q.contains("more than") || q.contains("over") {
        ">"
    } else if q.contains("less than") || q.contains("under") {
        "<"
    } else {
        ">="
    };

    let seconds = f64::from(years) * 365.25 * 24.0 * 3600.0;
    let sql = format!(
        "SELECT float_id, \
         MIN(profile_date) as first_profile_date, \
         MAX(profile_date) as last_profile_date, \
         COUNT(*) as total_profiles, \
         (MAX(profile_date) - MIN(profile_date)) as operating_duration \
         FROM argo_profiles \
         WHERE profile_date IS NOT NULL \
         GROUP BY float_id \
         HAVING EXTRACT(EPOCH FROM AGE(MAX(profile_date), MIN(profile_date))) {comparison} {seconds} \
         ORDER BY operating_duration DESC \
         LIMIT 100"
    );

    Some(SqlSynthesis {
        sql,
        explanation: format!("Floats operating {comparison} {years} years based on profile data"),
        estimated_results: format!("Floats with operating duration {comparison} {years} years"),
        parameters_used: vec!["profile_date".to_string()],
        method: GenerationMethod::OperatingDurationDirect,
        count_sql: None,
        error: None,
    })
}

// ─── year_count_direct ────────────────────────────────────────────────────────

/// Count-style wording plus at least one 4-digit year in 2018-2025.
pub fn is_year_count_query(query: &str) -> bool {
    let q = query.to_lowercase();
    let count_intent = ["how many", "number of profiles", "profiles in"]
        .iter()
        .any(|phrase| q.contains(phrase));
    count_intent && !extract_count_years(query).is_empty()
}

fn extract_count_years(query: &str) -> Vec<i32> {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    let year_rx = YEAR.get_or_init(|| regex(r"\b(201[8-9]|202[0-5])\b"));
    let mut years = Vec::new();
    for cap in year_rx.captures_iter(query) {
        if let Ok(year) = cap[1].parse::<i32>() {
            if !years.contains(&year) {
                years.push(year);
            }
        }
    }
    years
}

pub fn year_count(query: &str) -> Option<SqlSynthesis> {
    if !is_year_count_query(query) {
        return None;
    }
    let years = extract_count_years(query);
    let years_clause = years
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "SELECT EXTRACT(YEAR FROM profile_date) as year, COUNT(*) as count \
         FROM argo_profiles \
         WHERE profile_date IS NOT NULL \
         AND EXTRACT(YEAR FROM profile_date) IN ({years_clause}) \
         GROUP BY EXTRACT(YEAR FROM profile_date) \
         ORDER BY year"
    );

    Some(SqlSynthesis {
        sql,
        explanation: format!("Year-by-year profile counts for years: {years_clause}"),
        estimated_results: format!("Profile counts for {} years", years.len()),
        parameters_used: vec!["profile_date".to_string()],
        method: GenerationMethod::YearCountDirect,
        count_sql: None,
        error: None,
    })
}

// ─── nearest_floats_direct ────────────────────────────────────────────────────

/// "nearest"/"closest"/"near" with an explicit coordinate pair.
pub fn is_nearest_floats_query(query: &str) -> bool {
    let q = query.to_lowercase();
    let proximity = ["nearest", "closest", "near"].iter().any(|w| q.contains(w));
    let coordinate_hint = ["°", "degrees", "north", "south", "east", "west"]
        .iter()
        .any(|w| q.contains(w));
    proximity && coordinate_hint && parse_coordinates(query).is_some()
}

pub fn nearest_floats(query: &str) -> Option<SqlSynthesis> {
    if !is_nearest_floats_query(query) {
        return None;
    }
    let point = parse_coordinates(query)?;
    let (lat, lon) = (point.latitude, point.longitude);

    let distance = format!(
        "{EARTH_RADIUS_KM} * acos(\
         cos(radians({lat})) * cos(radians(p.latitude)) * \
         cos(radians(p.longitude) - radians({lon})) + \
         sin(radians({lat})) * sin(radians(p.latitude)))"
    );

    let sql = format!(
        "SELECT DISTINCT p.float_id, p.latitude, p.longitude, p.profile_date, \
         f.status, f.float_type, f.institution, \
         MIN({distance}) AS distance_km \
         FROM argo_profiles p \
         LEFT JOIN argo_floats f ON p.float_id = f.float_id \
         WHERE p.latitude IS NOT NULL \
         AND p.longitude IS NOT NULL \
         AND ({distance}) <= {NEAREST_RADIUS_KM} \
         GROUP BY p.float_id, p.latitude, p.longitude, p.profile_date, f.status, f.float_type, f.institution \
         ORDER BY distance_km ASC \
         LIMIT {NEAREST_LIMIT}"
    );

    Some(SqlSynthesis {
        sql,
        explanation: format!(
            "Found nearest ARGO floats to coordinates {lat}°N, {lon}°E using distance calculation"
        ),
        estimated_results: format!(
            "Up to {NEAREST_LIMIT} closest floats within {NEAREST_RADIUS_KM}km"
        ),
        parameters_used: vec!["latitude".to_string(), "longitude".to_string()],
        method: GenerationMethod::NearestFloatsDirect,
        count_sql: None,
        error: None,
    })
}

// ─── year_comparison_direct ───────────────────────────────────────────────────

/// Two or more distinct 4-digit years joined by comparison wording.
pub fn is_year_comparison_query(query: &str) -> bool {
    let q = query.to_lowercase();
    let comparison = ["compare", "versus", "vs"].iter().any(|w| q.contains(w));
    comparison && extract_comparison_years(query).len() >= 2
}

fn extract_comparison_years(query: &str) -> Vec<i32> {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    let year_rx = YEAR.get_or_init(|| regex(r"\b(19\d{2}|20\d{2})\b"));
    let mut years: Vec<i32> = year_rx
        .captures_iter(query)
        .filter_map(|cap| cap[1].parse().ok())
        .collect();
    years.sort_unstable();
    years.dedup();
    years
}

/// Whether the query restricts itself to the equatorial band.
pub fn mentions_equator(query: &str) -> bool {
    let q = query.to_lowercase();
    ["equator", "equatorial", "near the equator"]
        .iter()
        .any(|term| q.contains(term))
}

fn year_block(year: i32, equatorial: bool) -> String {
    let equator_filter = if equatorial {
        "AND latitude BETWEEN -5 AND 5 "
    } else {
        ""
    };
    format!(
        "(SELECT EXTRACT(YEAR FROM profile_date) AS year, profile_id, float_id, \
         latitude, longitude, profile_date, \
         temperature[1] AS surface_temperature, \
         salinity[1] AS surface_salinity, \
         pressure[1] AS surface_pressure \
         FROM argo_profiles \
         WHERE EXTRACT(YEAR FROM profile_date) = {year} \
         {equator_filter}\
         AND temperature IS NOT NULL \
         AND salinity IS NOT NULL \
         ORDER BY profile_date DESC)"
    )
}

pub fn year_comparison(query: &str) -> Option<SqlSynthesis> {
    if !is_year_comparison_query(query) {
        return None;
    }
    let years = extract_comparison_years(query);
    let (first, second) = (years[0], years[1]);
    let equatorial = mentions_equator(query);

    // Newest year's block first, matching the display order downstream.
    let sql = format!(
        "{} UNION ALL {} ORDER BY year DESC, profile_date DESC",
        year_block(second, equatorial),
        year_block(first, equatorial)
    );

    Some(SqlSynthesis {
        sql,
        explanation: format!(
            "Yearly comparison with oceanographic data for years: {first}, {second}"
        ),
        estimated_results: "Profile data for requested years with surface measurements".to_string(),
        parameters_used: vec![
            "profile_date".to_string(),
            "temperature".to_string(),
            "salinity".to_string(),
        ],
        method: GenerationMethod::YearComparisonDirect,
        count_sql: None,
        error: None,
    })
}

// ─── geographic_direct ────────────────────────────────────────────────────────

/// Any remaining coordinate pattern gets a ±1° rectangle scan.
pub fn is_geographic_query(query: &str) -> bool {
    parse_coordinates(query).is_some()
}

pub fn geographic(query: &str) -> Option<SqlSynthesis> {
    let point = parse_coordinates(query)?;
    let (lat, lon) = (point.latitude, point.longitude);

    let sql = format!(
        "SELECT * FROM argo_profiles \
         WHERE latitude BETWEEN {} AND {} \
         AND longitude BETWEEN {} AND {} \
         ORDER BY profile_date DESC LIMIT 100",
        lat - 1.0,
        lat + 1.0,
        lon - 1.0,
        lon + 1.0
    );

    Some(SqlSynthesis {
        sql,
        explanation: format!("Geographic query for profiles near {lat}°N, {lon}°E"),
        estimated_results: "Up to 100 profiles in geographic area".to_string(),
        parameters_used: vec!["latitude".to_string(), "longitude".to_string()],
        method: GenerationMethod::GeographicDirect,
        count_sql: None,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates_symbol_form() {
        let p = parse_coordinates("floats near 15.0°N, 65.0°E").expect("coords");
        assert_eq!(p.latitude, 15.0);
        assert_eq!(p.longitude, 65.0);
    }

    #[test]
    fn test_parse_coordinates_southern_western() {
        let p = parse_coordinates("profiles at 10°S, 75°W").expect("coords");
        assert_eq!(p.latitude, -10.0);
        assert_eq!(p.longitude, -75.0);
    }

    #[test]
    fn test_parse_coordinates_spelled_out() {
        let p = parse_coordinates("around 25 degrees North, 65 degrees East").expect("coords");
        assert_eq!(p.latitude, 25.0);
        assert_eq!(p.longitude, 65.0);
    }

    #[test]
    fn test_operating_duration_shape() {
        let s = operating_duration("Which floats have been operating for more than 3 years?")
            .expect("shape");
        assert_eq!(s.method, GenerationMethod::OperatingDurationDirect);
        assert!(s.sql.contains("GROUP BY float_id"));
        assert!(s.sql.contains("> 94672800"));
        assert!(s.sql.contains("AGE(MAX(profile_date), MIN(profile_date))"));
    }

    #[test]
    fn test_operating_duration_defaults_to_at_least() {
        let s = operating_duration("floats operating for 2 years").expect("shape");
        assert!(s.sql.contains(">= 63115200"));
    }

    #[test]
    fn test_year_count_shape() {
        let s = year_count("How many profiles in 2023?").expect("shape");
        assert_eq!(s.method, GenerationMethod::YearCountDirect);
        assert!(s.sql.contains("IN (2023)"));
        assert!(s.sql.contains("GROUP BY EXTRACT(YEAR FROM profile_date)"));
        assert!(s.sql.contains("ORDER BY year"));
    }

    #[test]
    fn test_year_count_ignores_out_of_window_years() {
        assert!(year_count("How many profiles in 2010?").is_none());
        assert!(year_count("how many floats do you have").is_none());
    }

    #[test]
    fn test_nearest_floats_shape() {
        let s = nearest_floats("Find the 10 nearest floats to 15.0°N, 65.0°E").expect("shape");
        assert_eq!(s.method, GenerationMethod::NearestFloatsDirect);
        assert!(s.sql.contains("6371 * acos("));
        assert!(s.sql.contains("radians(15)"));
        assert!(s.sql.contains("radians(65)"));
        assert!(s.sql.contains("<= 500"));
        assert!(s.sql.contains("ORDER BY distance_km ASC"));
        assert!(s.sql.contains("LIMIT 10"));
    }

    #[test]
    fn test_year_comparison_shape() {
        let s = year_comparison("Compare temperature between 2021 and 2022").expect("shape");
        assert_eq!(s.method, GenerationMethod::YearComparisonDirect);
        assert!(s.sql.contains("UNION ALL"));
        assert!(s.sql.contains("EXTRACT(YEAR FROM profile_date) = 2022"));
        assert!(s.sql.contains("EXTRACT(YEAR FROM profile_date) = 2021"));
        assert!(!s.sql.contains("BETWEEN -5 AND 5"));
    }

    #[test]
    fn test_year_comparison_equatorial_filter() {
        let s = year_comparison("Compare temperature near the equator between 2021 and 2022")
            .expect("shape");
        assert!(s.sql.contains("latitude BETWEEN -5 AND 5"));
    }

    #[test]
    fn test_year_comparison_needs_two_years() {
        assert!(year_comparison("Compare temperature in 2021").is_none());
        assert!(year_comparison("data for 2021 and 2022").is_none());
    }

    #[test]
    fn test_geographic_shape_rectangle() {
        let s = geographic("Show profiles at 20°N, 70°E").expect("shape");
        assert_eq!(s.method, GenerationMethod::GeographicDirect);
        assert!(s.sql.contains("latitude BETWEEN 19 AND 21"));
        assert!(s.sql.contains("longitude BETWEEN 69 AND 71"));
        assert!(s.sql.contains("ORDER BY profile_date DESC LIMIT 100"));
    }

    #[test]
    fn test_geographic_shape_fractional_rectangle() {
        let s = geographic("profiles around 15.5°N, 64.5°E").expect("shape");
        assert!(s.sql.contains("BETWEEN 14.5 AND 16.5"));
        assert!(s.sql.contains("BETWEEN 63.5 AND 65.5"));
    }
}
