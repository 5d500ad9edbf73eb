//! Visualization Builder
//!
//! Turns location-bearing rows into a coordinate track, GeoJSON, a time
//! series, and ready-to-run map snippets. Produces data only; rendering is
//! the UI's responsibility. Any failure here degrades to an error payload
//! and never fails the query result.

use crate::error::VisualizationError;
use crate::llm::{ChatMessage, LanguageModel, LlmRequest};
use crate::types::{Row, SqlValue, TrackPoint, VectorHit, VisualizationPayload};
use tracing::warn;

/// Marker cap for the interactive map document
const MAX_MAP_MARKERS: usize = 50;

pub struct VisualizationBuilder<'a> {
    gateway: &'a dyn LanguageModel,
}

impl<'a> VisualizationBuilder<'a> {
    pub fn new(gateway: &'a dyn LanguageModel) -> Self {
        Self { gateway }
    }

    /// Build the full payload from SQL rows, falling back to vector hit
    /// metadata when the rows are empty.
    pub async fn build(
        &self,
        rows: &[Row],
        hits: &[VectorHit],
    ) -> Result<VisualizationPayload, VisualizationError> {
        let rows = if rows.is_empty() {
            hits.iter().map(flatten_hit).collect()
        } else {
            rows.to_vec()
        };

        let coordinates = extract_coordinates(&rows);
        let geojson = if coordinates.is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            build_geojson(&coordinates)
        };
        let time_series = extract_time_series(&rows);
        let plot_code = if coordinates.is_empty() {
            String::new()
        } else {
            self.plot_code(&coordinates).await?
        };
        let leaflet_html = if coordinates.is_empty() {
            String::new()
        } else {
            build_leaflet_html(&coordinates, &rows)?
        };

        Ok(VisualizationPayload {
            coordinates,
            geojson,
            time_series,
            plot_code,
            leaflet_html,
        })
    }

    /// Plotting snippet via the code-tuned model; deterministic template
    /// when the gateway is down.
    async fn plot_code(&self, coordinates: &[[f64; 2]]) -> Result<String, VisualizationError> {
        let sample = &coordinates[..coordinates.len().min(100)];
        let sample_json = serde_json::to_string(sample)?;

        let request = LlmRequest::new(vec![
            ChatMessage::system(
                "Generate high-quality Python Plotly code for geographic trajectories.",
            ),
            ChatMessage::user(format!(
                "You are a Python visualization assistant. Generate standalone Plotly code that \
                 creates an interactive map with a trajectory polyline from given \
                 latitude/longitude pairs. Use scattergeo with mode='lines+markers', center view \
                 to the mean coordinate, and add coastline. Input coordinates are a Python list \
                 of [lat, lon].\n\nCoordinates (list of [lat, lon]): {sample_json}\n\n\
                 Return ONLY Python code that can be executed as-is (imports included)."
            )),
        ])
        .with_temperature(0.1)
        .with_max_tokens(800)
        .with_code_model();

        match self.gateway.generate(&request).await {
            Ok(code) => Ok(code),
            Err(e) => {
                warn!(error = %e, "Plot code generation failed, using template");
                Ok(plot_code_template(&sample_json))
            }
        }
    }
}

/// Deterministic plotting template used when the LLM is unavailable.
fn plot_code_template(sample_json: &str) -> String {
    format!(
        "import plotly.graph_objects as go\n\
         coordinates = {sample_json}\n\
         lats = [c[0] for c in coordinates]\n\
         lons = [c[1] for c in coordinates]\n\
         fig = go.Figure(go.Scattergeo(lat=lats, lon=lons, mode='lines+markers'))\n\
         fig.update_layout(geo=dict(showcoastlines=True, showcountries=True))\n\
         fig.show()\n"
    )
}

fn date_sort_key(row: &Row) -> String {
    row.get("profile_date")
        .or_else(|| row.get("profile_time"))
        .map(SqlValue::display)
        .unwrap_or_default()
}

/// `[[lat, lon], ...]` ordered by timestamp.
pub fn extract_coordinates(rows: &[Row]) -> Vec<[f64; 2]> {
    let mut sorted: Vec<&Row> = rows.iter().collect();
    sorted.sort_by_key(|row| date_sort_key(row));
    sorted
        .iter()
        .filter_map(|row| {
            let lat = row.get_f64("latitude")?;
            let lon = row.get_f64("longitude")?;
            Some([lat, lon])
        })
        .collect()
}

/// `{timestamp, lat, lon, profile_id, float_id}` per row, in row order.
pub fn extract_time_series(rows: &[Row]) -> Vec<TrackPoint> {
    rows.iter()
        .map(|row| TrackPoint {
            timestamp: row
                .get("profile_date")
                .filter(|v| !v.is_null())
                .map_or_else(|| "Unknown".to_string(), SqlValue::display),
            latitude: row.get_f64("latitude"),
            longitude: row.get_f64("longitude"),
            profile_id: row.get_str("profile_id").map(String::from),
            float_id: row.get_str("float_id").map(String::from),
        })
        .collect()
}

/// LineString feature collection. GeoJSON wants [lon, lat], the reverse of
/// the internal order.
pub fn build_geojson(coordinates: &[[f64; 2]]) -> serde_json::Value {
    let geo_coords: Vec<[f64; 2]> = coordinates.iter().map(|[lat, lon]| [*lon, *lat]).collect();
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {
                "type": "LineString",
                "coordinates": geo_coords,
            },
            "properties": {
                "name": "ARGO Trajectory",
            },
        }],
    })
}

/// Self-contained Leaflet document with the trajectory polyline and
/// per-position markers.
pub fn build_leaflet_html(
    coordinates: &[[f64; 2]],
    rows: &[Row],
) -> Result<String, VisualizationError> {
    if coordinates.is_empty() {
        return Ok(String::new());
    }

    let center_lat = coordinates.iter().map(|c| c[0]).sum::<f64>() / coordinates.len() as f64;
    let center_lon = coordinates.iter().map(|c| c[1]).sum::<f64>() / coordinates.len() as f64;

    let coord_pairs: Vec<[f64; 2]> = coordinates.iter().map(|[lat, lon]| [*lat, *lon]).collect();
    let coord_json = serde_json::to_string(&coord_pairs)?;

    let markers: Vec<serde_json::Value> = rows
        .iter()
        .take(MAX_MAP_MARKERS)
        .zip(coordinates.iter())
        .map(|(row, [lat, lon])| {
            serde_json::json!({
                "lat": lat,
                "lon": lon,
                "float_id": row.get_str("float_id").unwrap_or("Unknown"),
                "date": row.get("profile_date").map_or_else(|| "Unknown".to_string(), SqlValue::display),
            })
        })
        .collect();
    let markers_json = serde_json::to_string(&markers)?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>ARGO Float Trajectories</title>
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <style>
        body {{ margin: 0; padding: 0; }}
        #map {{ height: 100vh; width: 100%; }}
    </style>
</head>
<body>
    <div id="map"></div>
    <script>
        const map = L.map('map').setView([{center_lat}, {center_lon}], 6);
        L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
            attribution: '© OpenStreetMap contributors'
        }}).addTo(map);
        const trajectory = L.polyline({coord_json}, {{
            color: '#e74c3c',
            weight: 3,
            opacity: 0.8
        }}).addTo(map);
        const markers = {markers_json};
        markers.forEach(marker => {{
            L.marker([marker.lat, marker.lon])
                .addTo(map)
                .bindPopup(`<b>${{marker.float_id}}</b><br>${{marker.date}}`);
        }});
        if (trajectory.getLatLngs().length > 0) {{
            map.fitBounds(trajectory.getBounds());
        }}
    </script>
</body>
</html>"#
    ))
}

/// Vector hits contribute coordinates through their metadata.
fn flatten_hit(hit: &VectorHit) -> Row {
    let mut row = Row::new();
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
        hit.metadata.date.clone().map_or(SqlValue::Null, SqlValue::Text),
    );
    row.push(
        "profile_id",
        hit.metadata
            .profile_id
            .clone()
            .map_or(SqlValue::Null, SqlValue::Text),
    );
    row.push(
        "float_id",
        hit.metadata
            .float_id
            .clone()
            .map_or(SqlValue::Null, SqlValue::Text),
    );
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(lat: f64, lon: f64, date: &str, profile_id: &str) -> Row {
        let mut row = Row::new();
        row.push("profile_id", SqlValue::Text(profile_id.to_string()));
        row.push("float_id", SqlValue::Text("1902681".to_string()));
        row.push("latitude", SqlValue::Float(lat));
        row.push("longitude", SqlValue::Float(lon));
        row.push(
            "profile_date",
            SqlValue::Date(
                NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("date"),
            ),
        );
        row
    }

    #[test]
    fn test_coordinates_sorted_by_timestamp() {
        let rows = vec![
            row(12.0, 88.0, "2023-06-01", "p2"),
            row(10.0, 87.0, "2023-01-01", "p1"),
            row(14.0, 89.0, "2023-12-01", "p3"),
        ];
        let coords = extract_coordinates(&rows);
        assert_eq!(coords, vec![[10.0, 87.0], [12.0, 88.0], [14.0, 89.0]]);
    }

    #[test]
    fn test_rows_without_coordinates_skipped() {
        let mut bare = Row::new();
        bare.push("profile_id", SqlValue::Text("p0".to_string()));
        let rows = vec![bare, row(10.0, 87.0, "2023-01-01", "p1")];
        assert_eq!(extract_coordinates(&rows).len(), 1);
    }

    #[test]
    fn test_geojson_swaps_to_lon_lat() {
        let geojson = build_geojson(&[[10.0, 87.0], [12.0, 88.0]]);
        let coords = &geojson["features"][0]["geometry"]["coordinates"];
        assert_eq!(coords[0][0], 87.0);
        assert_eq!(coords[0][1], 10.0);
        assert_eq!(geojson["features"][0]["geometry"]["type"], "LineString");
    }

    #[test]
    fn test_time_series_fields() {
        let series = extract_time_series(&[row(10.0, 87.0, "2023-01-01", "p1")]);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].timestamp, "2023-01-01");
        assert_eq!(series[0].profile_id.as_deref(), Some("p1"));
        assert_eq!(series[0].float_id.as_deref(), Some("1902681"));
    }

    #[test]
    fn test_leaflet_document_embeds_track() {
        let rows = vec![row(10.0, 87.0, "2023-01-01", "p1")];
        let coords = extract_coordinates(&rows);
        let html = build_leaflet_html(&coords, &rows).expect("leaflet html");
        assert!(html.contains("L.polyline"));
        assert!(html.contains("1902681"));
        assert!(html.contains("leaflet@1.9.4"));
    }

    #[test]
    fn test_plot_template_is_runnable_shape() {
        let code = plot_code_template("[[10.0, 87.0]]");
        assert!(code.contains("import plotly.graph_objects"));
        assert!(code.contains("Scattergeo"));
    }
}
