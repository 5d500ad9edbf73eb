//! Relational schema description
//!
//! The schema text is embedded in LLM prompts verbatim; the table names are
//! part of the store contract because deterministic SQL templates reference
//! them directly.

pub const TABLE_PROFILES: &str = "argo_profiles";
pub const TABLE_FLOATS: &str = "argo_floats";

/// Full schema as structured text for LLM prompting.
pub fn database_schema() -> &'static str {
    r#"Database Schema for ARGO Oceanographic Data:

Table: argo_floats
- float_id (text, PRIMARY KEY) - Unique identifier for each ARGO float
- platform_number (text) - Platform number identifier
- deployment_date (date) - When float was deployed
- deployment_latitude (real) - Deployment latitude
- deployment_longitude (real) - Deployment longitude
- float_type (text) - Type of ARGO float
- institution (text) - Operating institution
- status (text) - Current status (ACTIVE, INACTIVE, etc.)
- last_profile_date (date) - Date of most recent profile
- total_profiles (integer) - Total number of profiles collected

Table: argo_profiles
- profile_id (text, PRIMARY KEY) - Unique profile identifier
- float_id (text) - References argo_floats.float_id
- latitude (real) - Profile location latitude
- longitude (real) - Profile location longitude
- profile_date (date) - Date profile was collected
- profile_time (time) - Time profile was collected
- pressure (real[]) - Array of pressure measurements (dbar)
- depth (real[]) - Array of depth measurements (meters)
- temperature (real[]) - Array of temperature measurements (°C)
- salinity (real[]) - Array of salinity measurements (PSU)
- dissolved_oxygen (real[]) - Array of oxygen measurements (μmol/kg)
- ph_in_situ (real[]) - Array of pH measurements
- nitrate (real[]) - Array of nitrate measurements (μmol/kg)
- chlorophyll_a (real[]) - Array of chlorophyll measurements (mg/m³)
- max_pressure (real) - Maximum pressure in profile
- n_levels (integer) - Number of measurement levels

Geographic Regions:
- Arabian Sea: latitude 10-25°N, longitude 50-80°E
- Bay of Bengal: latitude 5-22°N, longitude 80-100°E
- Indian Ocean: latitude -60-30°N, longitude 20-120°E
- Equatorial: latitude -5-5°N, any longitude
- Southern Ocean: latitude <-60°N, any longitude"#
}
