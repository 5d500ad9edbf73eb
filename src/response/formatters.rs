//! Deterministic answer formatters
//!
//! These present retrieved records without interpretation. The raw-data
//! formatter is the final fallback for every data-bearing query, so it
//! must handle every result shape the synthesizer can produce.

use super::format::{format_duration_days, format_lat, format_lon, thousands};
use crate::store::RelationalStore;
use crate::types::{DatabaseStats, ExtractedEntities, Row, RetrievedData, SqlValue, VectorHit};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::warn;

/// Float-id wordings accepted by the not-found and no-results paths
pub fn extract_float_id(query: &str) -> Option<String> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        #[allow(clippy::expect_used)]
        let rx = |p: &str| Regex::new(p).expect("invalid float-id pattern");
        vec![
            rx(r"float\s+(\d+)"),
            rx(r"argo\s+float\s+(\d+)"),
            rx(r"float\s+id\s+(\d+)"),
        ]
    });
    let query_lower = query.to_lowercase();
    patterns
        .iter()
        .find_map(|p| p.captures(&query_lower).map(|c| c[1].to_string()))
}

/// No-results formatter. When the query names a float that exists, report
/// its actual coverage instead of a dead-end message.
pub async fn no_results(
    query: &str,
    entities: &ExtractedEntities,
    store: &dyn RelationalStore,
) -> String {
    if let Some(float_id) = extract_float_id(query) {
        match store.float_date_range(&float_id).await {
            Ok(Some(range)) => {
                return format!(
                    "**No Data Found for Requested Date**\n\n\
                     Float {float_id} exists in the database but has no data for the requested date.\n\n\
                     **Available Data for Float {float_id}:**\n\
                     - Date Range: {first} to {last}\n\
                     - Total Profiles: {total}\n\n\
                     **Suggestions:**\n\
                     - Try a date within the available range ({first} to {last})\n\
                     - Ask for the temperature profile for a different date\n\
                     - Request general information about this float's data coverage",
                    first = range.first,
                    last = range.last,
                    total = range.total_profiles,
                );
            }
            Ok(None) => {
                return format!(
                    "Float {float_id} does not exist in the ARGO database. \
                     Please check the float ID and try again."
                );
            }
            Err(e) => warn!(error = %e, "Float date-range lookup failed"),
        }
    }

    let mut suggestions = Vec::new();
    if !entities.parameters.is_empty() {
        suggestions.push("Try searching for different oceanographic parameters");
    }
    if !entities.locations.is_empty() || !entities.regions.is_empty() {
        suggestions.push("Consider expanding the geographic area");
    }
    if !entities.dates.is_empty() {
        suggestions.push("Try a different date range");
    }
    let suggestion_text = if suggestions.is_empty() {
        String::new()
    } else {
        format!(" You might want to: {}.", suggestions.join(", "))
    };

    format!(
        "I couldn't find specific data matching your query about {query}.{suggestion_text} \
         You can also try rephrasing your question or asking for general information about \
         ARGO float data."
    )
}

/// Per-year accumulation for the comparison formatter
#[derive(Default)]
struct YearStats {
    count: i64,
    temperatures: Vec<f64>,
    salinities: Vec<f64>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::MAX, f64::MIN), |(lo, hi), v| {
        (lo.min(*v), hi.max(*v))
    })
}

/// Year-comparison formatter. Per-year population counts come fresh from
/// the store (same equatorial filter as the retrieval) so the report
/// reflects the full population, not the displayed window.
pub async fn year_comparison(
    rows: &[Row],
    equatorial: bool,
    store: &dyn RelationalStore,
) -> String {
    if rows.is_empty() {
        return "No data available for year comparison.".to_string();
    }

    let mut by_year: BTreeMap<i32, YearStats> = BTreeMap::new();
    for row in rows {
        let Some(year) = row.get("year").and_then(SqlValue::as_i64) else {
            continue;
        };
        let stats = by_year.entry(year as i32).or_default();
        if let Some(t) = row.get_f64("surface_temperature") {
            stats.temperatures.push(t);
        }
        if let Some(s) = row.get_f64("surface_salinity") {
            stats.salinities.push(s);
        }
        if let Some(lat) = row.get_f64("latitude") {
            stats.latitudes.push(lat);
        }
        if let Some(lon) = row.get_f64("longitude") {
            stats.longitudes.push(lon);
        }
    }

    let years: Vec<i32> = by_year.keys().copied().collect();
    if years.len() < 2 {
        return format!(
            "Found data for {} only. Need data from at least two different years for comparison.",
            years.first().copied().unwrap_or_default()
        );
    }

    for year in &years {
        let count = match store.year_profile_count(*year, equatorial).await {
            Ok(count) => count,
            Err(e) => {
                warn!(year, error = %e, "Per-year count failed");
                0
            }
        };
        if let Some(stats) = by_year.get_mut(year) {
            stats.count = count;
        }
    }

    let mut lines = vec!["**Ocean Conditions Comparison**".to_string(), String::new()];

    for (year, stats) in &by_year {
        lines.push(format!("**{year}:**"));
        lines.push(format!("- Profiles: {}", stats.count));
        if !stats.temperatures.is_empty() {
            let (lo, hi) = min_max(&stats.temperatures);
            lines.push(format!(
                "- Surface Temperature: {:.2}°C (range: {lo:.2}-{hi:.2}°C)",
                mean(&stats.temperatures)
            ));
        }
        if !stats.salinities.is_empty() {
            let (lo, hi) = min_max(&stats.salinities);
            lines.push(format!(
                "- Surface Salinity: {:.2} PSU (range: {lo:.2}-{hi:.2} PSU)",
                mean(&stats.salinities)
            ));
        }
        if !stats.latitudes.is_empty() && !stats.longitudes.is_empty() {
            let (lat_lo, lat_hi) = min_max(&stats.latitudes);
            let (lon_lo, lon_hi) = min_max(&stats.longitudes);
            lines.push(format!(
                "- Geographic Coverage: {} to {}, {} to {}",
                format_lat(lat_lo),
                format_lat(lat_hi),
                format_lon(lon_lo),
                format_lon(lon_hi)
            ));
        }
        lines.push(String::new());
    }

    if years.len() == 2 {
        let (first, second) = (years[0], years[1]);
        let (a, b) = (&by_year[&first], &by_year[&second]);
        lines.push("**Comparison Summary:**".to_string());

        if !a.temperatures.is_empty() && !b.temperatures.is_empty() {
            let delta = mean(&b.temperatures) - mean(&a.temperatures);
            lines.push(format!(
                "- Temperature: {second} was {delta:+.2}°C {} than {first}",
                if delta > 0.0 { "warmer" } else { "cooler" }
            ));
        }
        if !a.salinities.is_empty() && !b.salinities.is_empty() {
            let delta = mean(&b.salinities) - mean(&a.salinities);
            lines.push(format!(
                "- Salinity: {second} was {delta:+.2} PSU {} than {first}",
                if delta > 0.0 { "saltier" } else { "fresher" }
            ));
        }
        lines.push(format!(
            "- Data Coverage: {first} had {} profiles, {second} had {} profiles",
            a.count, b.count
        ));
    }

    lines.join("\n")
}

/// Float-not-found formatter: the statement executed but every projected
/// value came back NULL.
pub async fn float_not_found(
    query: &str,
    store: &dyn RelationalStore,
    stats: Option<&DatabaseStats>,
) -> String {
    let Some(float_id) = extract_float_id(query) else {
        return "I couldn't find the specific float you're asking about. \
                Please provide a valid float ID."
            .to_string();
    };

    let prefix: String = float_id.chars().take(4).collect();
    let similar_ids = match store.similar_float_ids(&prefix, 5).await {
        Ok(ids) => ids,
        Err(e) => {
            warn!(error = %e, "Similar-float lookup failed");
            Vec::new()
        }
    };

    let mut lines = vec![
        format!("**Float {float_id} Not Found**"),
        String::new(),
        format!("Float {float_id} does not exist in the ARGO database."),
    ];

    if let Some(stats) = stats {
        lines.push(String::new());
        lines.push("**Database Information:**".to_string());
        lines.push(format!(
            "- Total unique floats: {}",
            thousands(stats.total_floats)
        ));
        if let (Some(first), Some(last)) = (stats.earliest_profile, stats.latest_profile) {
            lines.push(format!("- Date range: {first} to {last}"));
        }
        lines.push(format!(
            "- Total profiles: {}",
            thousands(stats.total_profiles)
        ));
    }

    if !similar_ids.is_empty() {
        lines.push(String::new());
        lines.push("**Similar Float IDs:**".to_string());
        for id in &similar_ids {
            lines.push(format!("- {id}"));
        }
    }

    lines.push(String::new());
    lines.push(
        "Please check the float ID and try again, or ask about available floats in a \
         specific region or time period."
            .to_string(),
    );

    lines.join("\n")
}

/// Count-intent wording for the year-count table
fn has_count_intent(query: &str) -> bool {
    let q = query.to_lowercase();
    ["how many", "count", "number of profiles", "profiles in"]
        .iter()
        .any(|k| q.contains(k))
}

/// The deterministic raw-data formatter. Presents records exactly as
/// retrieved; no LLM involvement.
pub fn raw_data(query: &str, data: &RetrievedData) -> String {
    let rows = &data.sql_rows;
    let hits = &data.vector_hits;
    if rows.is_empty() && hits.is_empty() {
        return "No data available for your query.".to_string();
    }

    let total_count = data
        .total_count
        .unwrap_or_else(|| data.total_results() as i64);
    let sql_text = data.sql_text.as_deref().unwrap_or_default().to_lowercase();

    // Count-only result.
    if rows.len() == 1 && rows[0].contains_column("count") && rows[0].len() == 1 {
        let count = rows[0].get("count").and_then(SqlValue::as_i64).unwrap_or(0);
        return format!(
            "**Database Results** (1 record found):\n\n**Total Count**: {}\n",
            thousands(count)
        );
    }

    // Year-by-year count table.
    if has_count_intent(query)
        && !rows.is_empty()
        && rows
            .iter()
            .all(|r| r.contains_column("year") && r.contains_column("count"))
    {
        let mut year_counts: BTreeMap<i64, i64> = BTreeMap::new();
        for row in rows {
            let year = row.get("year").and_then(SqlValue::as_i64).unwrap_or(0);
            let count = row.get("count").and_then(SqlValue::as_i64).unwrap_or(0);
            year_counts.insert(year, count);
        }
        let mut out = format!(
            "**Database Results** ({} records found):\n\n**Profile Counts by Year:**\n\n",
            thousands(total_count)
        );
        for (year, count) in &year_counts {
            out.push_str(&format!("**{year}**: {} profiles\n", thousands(*count)));
        }
        let total: i64 = year_counts.values().sum();
        out.push_str(&format!("\n**Total**: {} profiles\n", thousands(total)));
        return out;
    }

    let mut out = format!(
        "**Database Results** ({} records found):\n\n",
        thousands(total_count)
    );
    if total_count > rows.len() as i64 && !rows.is_empty() {
        out.push_str("**Displaying a few of them:**\n\n");
    }

    // Aggregate result: min/max/avg/sum/count projections with no float_id.
    if !rows.is_empty()
        && !rows[0].contains_column("float_id")
        && ["min", "max", "avg", "sum", "count"]
            .iter()
            .any(|k| rows[0].contains_column(k))
    {
        out.push_str(&format_aggregate(&rows[0], &sql_text));
        return out;
    }

    // Latitude-band result: latitude plus surface/deep temperature columns.
    if !rows.is_empty()
        && !rows[0].contains_column("float_id")
        && rows[0].contains_column("latitude")
        && (rows[0].contains_column("surface_temp") || rows[0].contains_column("deep_temp"))
    {
        out.push_str(&format_latitude_bands(rows));
        return out;
    }

    // Nearest-floats result.
    if !rows.is_empty() && rows[0].contains_column("distance_km") {
        out.push_str(&format_nearest_floats(rows));
        return out;
    }

    out.push_str(&format_by_float(rows, hits));
    out
}

fn format_aggregate(row: &Row, sql_text: &str) -> String {
    let mut out = String::new();
    for (key, value) in row.iter() {
        match key.as_str() {
            "min" | "max" | "avg" => {
                let label = {
                    let mut c = key.chars();
                    match c.next() {
                        Some(first) => first.to_uppercase().collect::<String>() + c.as_str(),
                        None => key.clone(),
                    }
                };
                if let Some(v) = value.as_f64() {
                    if sql_text.contains("temperature") {
                        out.push_str(&format!("**{label} Temperature**: {v:.2}°C\n"));
                    } else if sql_text.contains("salinity") {
                        out.push_str(&format!("**{label} Salinity**: {v:.2} PSU\n"));
                    } else if sql_text.contains("depth") || sql_text.contains("pressure") {
                        out.push_str(&format!("**{label} Depth**: {v:.1}m\n"));
                    } else {
                        out.push_str(&format!("**{label}**: {}\n", value.display()));
                    }
                } else {
                    out.push_str(&format!("**{label}**: not available\n"));
                }
            }
            "count" => {
                let count = value.as_i64().unwrap_or(0);
                out.push_str(&format!("**Total Count**: {}\n", thousands(count)));
            }
            "sum" => {
                out.push_str(&format!("**Total Sum**: {}\n", value.display()));
            }
            _ => {}
        }
    }
    out
}

fn format_latitude_bands(rows: &[Row]) -> String {
    let mut out = String::new();
    for row in rows {
        let Some(lat) = row.get_f64("latitude") else {
            continue;
        };
        out.push_str(&format!("**{}**:\n", format_lat(lat)));
        if let Some(surface) = row.get_f64("surface_temp") {
            out.push_str(&format!("  - Surface Temperature: {surface:.2}°C\n"));
        }
        if let Some(deep) = row.get_f64("deep_temp") {
            out.push_str(&format!("  - Deep Temperature: {deep:.2}°C\n"));
        }
        out.push('\n');
    }
    out
}

fn format_nearest_floats(rows: &[Row]) -> String {
    // One entry per float, keeping its closest observation.
    let mut floats: Vec<(&str, &Row)> = Vec::new();
    for row in rows {
        let Some(float_id) = row.get_str("float_id") else {
            continue;
        };
        if !floats.iter().any(|(id, _)| *id == float_id) {
            floats.push((float_id, row));
        }
    }
    floats.sort_by(|a, b| {
        let da = a.1.get_f64("distance_km").unwrap_or(f64::MAX);
        let db = b.1.get_f64("distance_km").unwrap_or(f64::MAX);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = format!("Found {} nearest ARGO floats:\n\n", floats.len());
    for (float_id, row) in floats.iter().take(10) {
        let distance = row.get_f64("distance_km").unwrap_or(0.0);
        out.push_str(&format!("**Float {float_id}** ({distance:.1}km away):\n"));
        if let (Some(lat), Some(lon)) = (row.get_f64("latitude"), row.get_f64("longitude")) {
            out.push_str(&format!(
                "  - Location: {}, {}\n",
                format_lat(lat),
                format_lon(lon)
            ));
        }
        if let Some(date) = row.get("profile_date") {
            if !date.is_null() {
                out.push_str(&format!("  - Date: {}\n", date.display()));
            }
        }
        if let Some(status) = row.get_str("status") {
            out.push_str(&format!("  - Status: {status}\n"));
        }
        out.push('\n');
    }
    out
}

/// Flatten a vector hit into the record shape the grouped formatter reads.
fn flatten_hit(hit: &VectorHit) -> Row {
    let mut row = Row::new();
    row.push(
        "float_id",
        hit.metadata
            .float_id
            .clone()
            .map_or(SqlValue::Null, SqlValue::Text),
    );
    row.push(
        "profile_id",
        hit.metadata
            .profile_id
            .clone()
            .map_or(SqlValue::Null, SqlValue::Text),
    );
    row.push(
        "latitude",
        hit.metadata.latitude.map_or(SqlValue::Null, SqlValue::Float),
    );
    row.push(
        "longitude",
        hit.metadata.longitude.map_or(SqlValue::Null, SqlValue::Float),
    );
    row.push(
        "profile_date",
        hit.metadata
            .date
            .clone()
            .map_or(SqlValue::Null, SqlValue::Text),
    );
    row
}

fn format_by_float(rows: &[Row], hits: &[VectorHit]) -> String {
    let flattened: Vec<Row>;
    let records: &[Row] = if rows.is_empty() {
        flattened = hits.iter().map(flatten_hit).collect();
        &flattened
    } else {
        rows
    };

    // Group by float id, preserving first-seen order.
    let mut groups: Vec<(String, Vec<&Row>)> = Vec::new();
    for row in records {
        let float_id = row
            .get_str("float_id")
            .unwrap_or("Unknown")
            .to_string();
        match groups.iter_mut().find(|(id, _)| *id == float_id) {
            Some((_, group)) => group.push(row),
            None => groups.push((float_id, vec![row])),
        }
    }

    let mut out = String::new();
    for (float_id, group) in groups.iter().take(20) {
        out.push_str(&format!("**Float {float_id}** ({} records):\n", group.len()));
        for (i, row) in group.iter().take(5).enumerate() {
            out.push_str(&format_record(i + 1, float_id, row));
        }
        if group.len() > 5 {
            out.push_str(&format!("     ... and {} more records\n", group.len() - 5));
        }
        out.push('\n');
    }
    if groups.len() > 20 {
        out.push_str(&format!("... and {} more floats\n", groups.len() - 20));
    }
    out
}

fn format_record(index: usize, float_id: &str, row: &Row) -> String {
    let lat = row.get_f64("latitude");
    let lon = row.get_f64("longitude");

    if let (Some(lat), Some(lon)) = (lat, lon) {
        let profile_id = row.get_str("profile_id").unwrap_or("Unknown");
        let date = row
            .get("profile_date")
            .map_or_else(|| "Unknown".to_string(), SqlValue::display);
        let depth_info = row
            .get_f64("max_pressure")
            .map(|p| format!(" - {p:.1}m depth"))
            .unwrap_or_default();
        format!(
            "  {index}. {profile_id}: {}, {} ({date}){depth_info}\n",
            format_lat(lat),
            format_lon(lon)
        )
    } else {
        // Summary record (operating-duration shape).
        let first = row
            .get("first_profile_date")
            .map_or_else(|| "Unknown".to_string(), SqlValue::display);
        let last = row
            .get("last_profile_date")
            .map_or_else(|| "Unknown".to_string(), SqlValue::display);
        let total = row
            .get("total_profiles")
            .and_then(SqlValue::as_i64)
            .unwrap_or(0);
        let duration = row
            .get("operating_duration")
            .and_then(SqlValue::as_i64)
            .map_or_else(|| "Unknown".to_string(), format_duration_days);
        format!("  {index}. {float_id}: {first} to {last} ({total} profiles, {duration})\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_row(count: i64) -> Row {
        let mut row = Row::new();
        row.push("count", SqlValue::Int(count));
        row
    }

    fn location_row(float_id: &str, profile_id: &str, lat: f64, lon: f64) -> Row {
        let mut row = Row::new();
        row.push("float_id", SqlValue::Text(float_id.to_string()));
        row.push("profile_id", SqlValue::Text(profile_id.to_string()));
        row.push("latitude", SqlValue::Float(lat));
        row.push("longitude", SqlValue::Float(lon));
        row.push(
            "profile_date",
            SqlValue::Date(chrono::NaiveDate::from_ymd_opt(2023, 5, 14).expect("date")),
        );
        row
    }

    #[test]
    fn test_extract_float_id_wordings() {
        assert_eq!(extract_float_id("Float 9999999 data").as_deref(), Some("9999999"));
        assert_eq!(
            extract_float_id("show argo float 1902681").as_deref(),
            Some("1902681")
        );
        assert_eq!(extract_float_id("float id 123").as_deref(), Some("123"));
        assert!(extract_float_id("profiles in 2023").is_none());
    }

    #[test]
    fn test_count_only_result() {
        let data = RetrievedData {
            sql_rows: vec![count_row(122_215)],
            total_count: Some(122_215),
            ..Default::default()
        };
        let out = raw_data("how many profiles total", &data);
        assert!(out.contains("**Total Count**: 122,215"));
    }

    #[test]
    fn test_year_count_table() {
        let mut row_2022 = Row::new();
        row_2022.push("year", SqlValue::Float(2022.0));
        row_2022.push("count", SqlValue::Int(15_000));
        let mut row_2023 = Row::new();
        row_2023.push("year", SqlValue::Float(2023.0));
        row_2023.push("count", SqlValue::Int(18_500));

        let data = RetrievedData {
            sql_rows: vec![row_2022, row_2023],
            total_count: Some(33_500),
            ..Default::default()
        };
        let out = raw_data("How many profiles in 2022 and 2023?", &data);
        assert!(out.contains("**2022**: 15,000 profiles"));
        assert!(out.contains("**2023**: 18,500 profiles"));
        assert!(out.contains("**Total**: 33,500 profiles"));
    }

    #[test]
    fn test_aggregate_with_temperature_unit() {
        let mut row = Row::new();
        row.push("min", SqlValue::Float(22.456));
        row.push("max", SqlValue::Float(29.891));
        let data = RetrievedData {
            sql_rows: vec![row],
            sql_text: Some("SELECT MIN(temperature[1]), MAX(temperature[1]) FROM argo_profiles".into()),
            total_count: Some(1),
            ..Default::default()
        };
        let out = raw_data("temperature data range", &data);
        assert!(out.contains("**Min Temperature**: 22.46°C"));
        assert!(out.contains("**Max Temperature**: 29.89°C"));
    }

    #[test]
    fn test_nearest_floats_grouping_and_sorting() {
        let mut far = location_row("2902746", "2902746_001", 16.0, 66.0);
        far.push("distance_km", SqlValue::Float(320.5));
        let mut near = location_row("1902681", "1902681_004", 15.1, 65.2);
        near.push("distance_km", SqlValue::Float(12.3));

        let data = RetrievedData {
            sql_rows: vec![far, near],
            total_count: Some(2),
            ..Default::default()
        };
        let out = raw_data("nearest floats to 15N 65E", &data);
        let first = out.find("Float 1902681").expect("near float");
        let second = out.find("Float 2902746").expect("far float");
        assert!(first < second, "nearest float should come first");
        assert!(out.contains("12.3km away"));
        assert!(out.contains("15.100°N, 65.200°E"));
    }

    #[test]
    fn test_grouped_by_float_with_window_note() {
        let rows: Vec<Row> = (0..3)
            .map(|i| location_row("1902681", &format!("1902681_{i:03}"), 10.0 + i as f64, 80.0))
            .collect();
        let data = RetrievedData {
            sql_rows: rows,
            total_count: Some(40),
            ..Default::default()
        };
        let out = raw_data("show float 1902681 data", &data);
        assert!(out.contains("(40 records found)"));
        assert!(out.contains("**Displaying a few of them:**"));
        assert!(out.contains("**Float 1902681** (3 records):"));
        assert!(out.contains("10.000°N, 80.000°E"));
    }

    #[test]
    fn test_vector_hits_flattened_when_no_rows() {
        let hit = VectorHit {
            id: "p1".to_string(),
            document: "Profile summary".to_string(),
            metadata: crate::types::HitMetadata {
                float_id: Some("2902745".to_string()),
                profile_id: Some("2902745_010".to_string()),
                latitude: Some(-2.5),
                longitude: Some(85.0),
                date: Some("2022-11-03".to_string()),
                geographic_note: None,
            },
            distance: 0.2,
        };
        let data = RetrievedData {
            vector_hits: vec![hit],
            ..Default::default()
        };
        let out = raw_data("show data", &data);
        assert!(out.contains("**Float 2902745**"));
        assert!(out.contains("2.500°S, 85.000°E"));
    }

    #[test]
    fn test_no_raw_signed_coordinates_in_output() {
        let data = RetrievedData {
            sql_rows: vec![location_row("1902681", "p1", -12.345, 78.9)],
            total_count: Some(1),
            ..Default::default()
        };
        let out = raw_data("show float 1902681 data", &data);
        assert!(out.contains("12.345°S"));
        assert!(!out.contains("-12.345"));
    }
}
