//! Tabular input: rows of scalar cells plus the column classification and
//! display formats supplied by the ingestion layer.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::format::{ColumnFormat, raw_number};

/// A single cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&raw_number(*n)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Fields added to a row by the geocoding collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Geocode {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geocoded: bool,
    pub source: Option<String>,
}

/// An ordered mapping of column name to value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DataRow {
    pub cells: IndexMap<String, Value>,
    pub geocode: Option<Geocode>,
}

impl DataRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    /// Builder used by hosts and tests
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for DataRow {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        DataRow {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            geocode: None,
        }
    }
}

/// Column classification from the ingestion layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Date,
    Coordinate,
    RegionCode,
    Country,
}

/// Rows plus per-column type and display format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Dataset {
    pub rows: Vec<DataRow>,
    pub column_types: IndexMap<String, ColumnType>,
    pub column_formats: IndexMap<String, ColumnFormat>,
}

impl Dataset {
    pub fn new(rows: Vec<DataRow>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn column_type(&self, column: &str) -> ColumnType {
        self.column_types.get(column).copied().unwrap_or_default()
    }

    pub fn column_format(&self, column: &str) -> Option<&ColumnFormat> {
        self.column_formats.get(column)
    }

    pub fn with_type(mut self, column: impl Into<String>, ty: ColumnType) -> Self {
        self.column_types.insert(column.into(), ty);
        self
    }

    pub fn with_format(mut self, column: impl Into<String>, format: ColumnFormat) -> Self {
        self.column_formats.insert(column.into(), format);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_deserialize_from_json_scalars() {
        let row: DataRow = serde_json::from_str(
            r#"{"cells": {"state": "California", "value": 50, "flag": true, "empty": null}}"#,
        )
        .unwrap();
        assert_eq!(row.get("state"), Some(&Value::Text("California".into())));
        assert_eq!(row.get("value"), Some(&Value::Number(50.0)));
        assert_eq!(row.get("flag"), Some(&Value::Bool(true)));
        assert_eq!(row.get("empty"), Some(&Value::Null));
        // insertion order is kept
        let cols: Vec<&str> = row.cells.keys().map(String::as_str).collect();
        assert_eq!(cols, ["state", "value", "flag", "empty"]);
    }

    #[test]
    fn display_of_numbers_is_minimal() {
        assert_eq!(Value::Number(1500.0).to_string(), "1500");
        assert_eq!(Value::Number(1.25).to_string(), "1.25");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("  ").is_blank());
        assert!(!Value::from(0.0).is_blank());
    }
}
