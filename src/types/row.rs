//! Dynamic SQL result rows
//!
//! The relational client decodes every projected column into a closed
//! `SqlValue` enum. Column order is preserved because formatters iterate
//! rows in projection order.

use chrono::{NaiveDate, NaiveTime};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A single decoded SQL value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Measurement array column; elements may be NULL at individual levels
    FloatArray(Vec<Option<f64>>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Numeric view: integers widen to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Float(v) => Some(*v),
            SqlValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SqlValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_float_array(&self) -> Option<&[Option<f64>]> {
        match self {
            SqlValue::FloatArray(a) => Some(a),
            _ => None,
        }
    }

    /// Best-effort display string, used by formatters for unknown columns.
    pub fn display(&self) -> String {
        match self {
            SqlValue::Null => "not available".to_string(),
            SqlValue::Bool(v) => v.to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Float(v) => format!("{v:.2}"),
            SqlValue::Text(s) => s.clone(),
            SqlValue::Date(d) => d.to_string(),
            SqlValue::Time(t) => t.to_string(),
            SqlValue::FloatArray(a) => format!("[{} levels]", a.len()),
        }
    }
}

/// One SQL result row: column name → value, in projection order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.entries.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, SqlValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convenience numeric accessor.
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(SqlValue::as_f64)
    }

    /// Convenience string accessor.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(SqlValue::as_str)
    }

    /// All values are NULL (the shape Postgres returns for aggregates over
    /// an empty match, e.g. `SELECT MAX(x) ... WHERE <no rows>`).
    pub fn all_null(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|(_, v)| v.is_null())
    }
}

impl FromIterator<(String, SqlValue)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, SqlValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        let mut row = Row::new();
        row.push("float_id", SqlValue::Text("1902681".to_string()));
        row.push("latitude", SqlValue::Float(15.234));
        row.push("count", SqlValue::Int(42));
        row
    }

    #[test]
    fn test_row_access() {
        let row = sample_row();
        assert_eq!(row.get_str("float_id"), Some("1902681"));
        assert_eq!(row.get_f64("latitude"), Some(15.234));
        assert_eq!(row.get_f64("count"), Some(42.0));
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_all_null_detection() {
        let mut row = Row::new();
        row.push("max", SqlValue::Null);
        row.push("min", SqlValue::Null);
        assert!(row.all_null());

        let row = sample_row();
        assert!(!row.all_null());
        assert!(!Row::new().all_null());
    }

    #[test]
    fn test_float_ids_stay_text() {
        // Identifiers are opaque strings end to end; a numeric accessor on
        // an id column must not succeed.
        let row = sample_row();
        assert!(row.get_f64("float_id").is_none());
    }
}
