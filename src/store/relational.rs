//! Relational store client (PostgreSQL)
//!
//! Executes synthesized SQL and decodes whatever columns the statement
//! projected into dynamic [`Row`]s. Measurement arrays decode with
//! per-level NULLs preserved.

use crate::error::StoreError;
use crate::types::{DatabaseStats, Row, SqlValue};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, Row as SqlxRow, TypeInfo};
use tracing::debug;

/// Date coverage of one float's profiles
#[derive(Debug, Clone, PartialEq)]
pub struct FloatDateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub total_profiles: i64,
}

/// The relational seam the coordinator and response shaper depend on.
///
/// The lookup helpers have provided implementations in terms of `query`,
/// so test doubles only supply the three required methods.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Execute a validated SELECT and decode all rows.
    async fn query(&self, sql: &str) -> Result<Vec<Row>, StoreError>;

    /// Aggregate statistics snapshot.
    async fn stats(&self) -> Result<DatabaseStats, StoreError>;

    /// Connectivity probe.
    async fn ping(&self) -> bool;

    /// Date range and profile count for one float, `None` when the float
    /// has no profiles.
    async fn float_date_range(&self, float_id: &str) -> Result<Option<FloatDateRange>, StoreError> {
        let id = sanitize_id(float_id);
        let sql = format!(
            "SELECT MIN(profile_date) as min_date, MAX(profile_date) as max_date, \
             COUNT(*) as total_profiles FROM argo_profiles WHERE float_id = '{id}'"
        );
        let rows = self.query(&sql).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let total = row.get("total_profiles").and_then(SqlValue::as_i64).unwrap_or(0);
        let first = row.get("min_date").and_then(SqlValue::as_date);
        let last = row.get("max_date").and_then(SqlValue::as_date);
        match (first, last) {
            (Some(first), Some(last)) if total > 0 => Ok(Some(FloatDateRange {
                first,
                last,
                total_profiles: total,
            })),
            _ => Ok(None),
        }
    }

    /// Float ids sharing a prefix, for "did you mean" suggestions.
    async fn similar_float_ids(&self, prefix: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        let prefix = sanitize_id(prefix);
        let sql = format!(
            "SELECT DISTINCT float_id FROM argo_profiles \
             WHERE float_id LIKE '{prefix}%' ORDER BY float_id LIMIT {limit}"
        );
        let rows = self.query(&sql).await?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str("float_id").map(String::from))
            .collect())
    }

    /// Full population count for one year's profiles with temperature and
    /// salinity present, optionally restricted to the equatorial band.
    async fn year_profile_count(&self, year: i32, equatorial_only: bool) -> Result<i64, StoreError> {
        let equator_filter = if equatorial_only {
            "AND latitude BETWEEN -5 AND 5 "
        } else {
            ""
        };
        let sql = format!(
            "SELECT COUNT(*) as count FROM argo_profiles \
             WHERE EXTRACT(YEAR FROM profile_date) = {year} \
             {equator_filter}\
             AND temperature IS NOT NULL AND salinity IS NOT NULL"
        );
        let rows = self.query(&sql).await?;
        Ok(rows
            .first()
            .and_then(|r| r.get("count"))
            .and_then(SqlValue::as_i64)
            .unwrap_or(0))
    }
}

/// Identifiers are opaque digit strings; strip anything that could break
/// out of a quoted literal.
fn sanitize_id(id: &str) -> String {
    id.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Production Postgres client
#[derive(Clone)]
pub struct PgRelationalStore {
    pool: sqlx::PgPool,
}

impl PgRelationalStore {
    /// Connect a pool. Called once at startup.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationalStore for PgRelationalStore {
    async fn query(&self, sql: &str) -> Result<Vec<Row>, StoreError> {
        debug!(sql = %sql, "Executing SQL");
        let pg_rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        pg_rows.iter().map(decode_row).collect()
    }

    async fn stats(&self) -> Result<DatabaseStats, StoreError> {
        let (total_profiles, total_floats, earliest, latest): (
            i64,
            i64,
            Option<NaiveDate>,
            Option<NaiveDate>,
        ) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT float_id), MIN(profile_date), MAX(profile_date) \
             FROM argo_profiles",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DatabaseStats {
            total_profiles,
            total_floats,
            earliest_profile: earliest,
            latest_profile: latest,
        })
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

/// Decode one Postgres row into the dynamic row type, dispatching on the
/// column's declared type.
fn decode_row(pg_row: &PgRow) -> Result<Row, StoreError> {
    let mut row = Row::new();
    for (index, column) in pg_row.columns().iter().enumerate() {
        let name = column.name().to_string();
        let type_name = column.type_info().name().to_uppercase();
        let value = decode_value(pg_row, index, &name, &type_name)?;
        row.push(name, value);
    }
    Ok(row)
}

fn decode_value(
    pg_row: &PgRow,
    index: usize,
    column: &str,
    type_name: &str,
) -> Result<SqlValue, StoreError> {
    let value = match type_name {
        "BOOL" => pg_row
            .try_get::<Option<bool>, _>(index)?
            .map_or(SqlValue::Null, SqlValue::Bool),
        "INT2" => pg_row
            .try_get::<Option<i16>, _>(index)?
            .map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))),
        "INT4" => pg_row
            .try_get::<Option<i32>, _>(index)?
            .map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))),
        "INT8" => pg_row
            .try_get::<Option<i64>, _>(index)?
            .map_or(SqlValue::Null, SqlValue::Int),
        "FLOAT4" => pg_row
            .try_get::<Option<f32>, _>(index)?
            .map_or(SqlValue::Null, |v| SqlValue::Float(f64::from(v))),
        "FLOAT8" => pg_row
            .try_get::<Option<f64>, _>(index)?
            .map_or(SqlValue::Null, SqlValue::Float),
        // EXTRACT and aggregate projections come back as NUMERIC.
        "NUMERIC" => pg_row
            .try_get::<Option<sqlx::types::BigDecimal>, _>(index)?
            .and_then(|d| d.to_string().parse::<f64>().ok())
            .map_or(SqlValue::Null, SqlValue::Float),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => pg_row
            .try_get::<Option<String>, _>(index)?
            .map_or(SqlValue::Null, SqlValue::Text),
        "DATE" => pg_row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map_or(SqlValue::Null, SqlValue::Date),
        "TIME" => pg_row
            .try_get::<Option<NaiveTime>, _>(index)?
            .map_or(SqlValue::Null, SqlValue::Time),
        "FLOAT4[]" => pg_row
            .try_get::<Option<Vec<Option<f32>>>, _>(index)?
            .map_or(SqlValue::Null, |a| {
                SqlValue::FloatArray(a.into_iter().map(|v| v.map(f64::from)).collect())
            }),
        "FLOAT8[]" => pg_row
            .try_get::<Option<Vec<Option<f64>>>, _>(index)?
            .map_or(SqlValue::Null, SqlValue::FloatArray),
        other => {
            return Err(StoreError::UnsupportedColumnType {
                column: column.to_string(),
                type_name: other.to_string(),
            })
        }
    };
    Ok(value)
}
