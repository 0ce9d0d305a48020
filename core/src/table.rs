//! Dynamic tabular model for uploaded record sets.
//!
//! Uploaded case and status exports vary in shape, so the pipeline works
//! against a column-name-addressed table rather than fixed structs. Missing
//! columns are a normal condition: every lookup returns an Option and the
//! caller decides how that computation degrades.

use crate::error::TriageResult;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Cell values ──────────────────────────────────────────────────────────────

/// A single cell. Untagged so a JSON record set maps directly onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

/// Timestamp formats accepted from free-text cells, probed in order.
/// Date-only formats are taken as midnight.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d-%b-%Y"];

/// Shared null cell for absent-column lookups.
const NULL: &Value = &Value::Null;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the cell as text. Only `Text` cells qualify; a numeric or
    /// boolean cell is not a note.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the cell as a timestamp. Free text is probed against the
    /// accepted formats; anything unparseable is None, never an error.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            Value::Text(s) => parse_datetime(s.trim()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        self.as_datetime().map(|dt| dt.date())
    }

    /// Render the cell for display and for cross-tab keys.
    pub fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Text(s) => s.clone(),
        }
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

// ── Table ────────────────────────────────────────────────────────────────────

/// An ordered set of named columns over row-major cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// An empty, column-less table — the degraded result of a computation
    /// whose required columns are absent.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding or truncating to the table width.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// First-match probe over a priority list of acceptable column names.
    /// Returns the matched name alongside its index so callers can report
    /// which alternative was used.
    pub fn probe_column<S: AsRef<str>>(&self, names: &[S]) -> Option<(usize, &str)> {
        for name in names {
            if let Some(idx) = self.column_index(name.as_ref()) {
                return Some((idx, &self.columns[idx]));
            }
        }
        None
    }

    pub fn value(&self, row: usize, col: usize) -> &Value {
        &self.rows[row][col]
    }

    /// Cell addressed by column name; Null when the column is absent.
    pub fn cell(&self, row: usize, name: &str) -> &Value {
        match self.column_index(name) {
            Some(col) => &self.rows[row][col],
            None => NULL,
        }
    }

    /// Write a full column of derived values. An existing column of the same
    /// name is overwritten in place (the reconciled columns own their names);
    /// otherwise the column is appended. `values` must be one per row.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(col) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[col] = v;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
    }

    /// Rows for which the predicate holds, same columns.
    pub fn filter<F: Fn(&[Value]) -> bool>(&self, keep: F) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| keep(r))
                .cloned()
                .collect(),
        }
    }

    /// Reorder columns so that the named ones (those present) come first, in
    /// the given order, followed by the remaining columns in original order.
    pub fn promote_columns(&self, front: &[&str]) -> Table {
        let mut order: Vec<usize> = front
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        for idx in 0..self.columns.len() {
            if !order.contains(&idx) {
                order.push(idx);
            }
        }

        let columns = order.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|r| order.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Table { columns, rows }
    }

    // ── JSON record sets ─────────────────────────────────────────────────

    /// Build a table from a JSON array of objects. Column order is the order
    /// keys are first seen; rows missing a key get Null.
    pub fn from_records(records: &serde_json::Value) -> TriageResult<Table> {
        let arr = records
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("expected a JSON array of records"))?;

        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for rec in arr {
            if let Some(obj) = rec.as_object() {
                for key in obj.keys() {
                    if !index.contains_key(key) {
                        index.insert(key.clone(), columns.len());
                        columns.push(key.clone());
                    }
                }
            }
        }

        let mut table = Table::new(columns);
        for rec in arr {
            let obj = rec
                .as_object()
                .ok_or_else(|| anyhow::anyhow!("expected each record to be a JSON object"))?;
            let mut row = vec![Value::Null; table.n_cols()];
            for (key, val) in obj {
                row[index[key]] = json_to_value(val);
            }
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Serialize back to a JSON array of objects.
    pub fn to_records(&self) -> serde_json::Value {
        let mut out = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut obj = serde_json::Map::new();
            for (name, cell) in self.columns.iter().zip(row) {
                obj.insert(name.clone(), value_to_json(cell));
            }
            out.push(serde_json::Value::Object(obj));
        }
        serde_json::Value::Array(out)
    }
}

fn json_to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::Text(s.clone()),
        // Nested structures are out of scope for tabular data; keep the raw text.
        other => Value::Text(other.to_string()),
    }
}

fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Float(f) => serde_json::Value::from(*f),
        Value::DateTime(dt) => {
            serde_json::Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())
        }
        Value::Text(s) => serde_json::Value::String(s.clone()),
    }
}
