//! Core data models for record batches.
//!
//! A batch is a [`RecordTable`]: an ordered column schema plus rows of JSON
//! objects. Column presence is a property of the schema, so "the column is
//! absent" and "the value is null" stay distinguishable.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CrashDqError, Result};

/// Format version written to and accepted from batch documents.
pub const BATCH_FORMAT_VERSION: &str = "1.0";

/// One row of a batch.
pub type Record = serde_json::Map<String, Value>;

static NULL: Value = Value::Null;

/// A table of records with an explicit, ordered column schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordTable {
    /// Column names in schema order
    pub columns: Vec<String>,
    /// Row objects; a missing key reads as null
    pub rows: Vec<Record>,
}

impl RecordTable {
    /// Creates an empty table with the given columns.
    ///
    /// Duplicate column names are dropped, keeping the first occurrence.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for column in columns {
            table.ensure_column(column);
        }
        table
    }

    /// Creates a table with an explicit schema and rows.
    pub fn with_rows<I, S>(columns: I, rows: Vec<Record>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        table.rows = rows;
        table
    }

    /// Creates a table whose schema is the union of row keys in first-seen
    /// order.
    pub fn from_rows(rows: Vec<Record>) -> Self {
        let mut table = Self::default();
        for row in &rows {
            for key in row.keys() {
                table.ensure_column(key.as_str());
            }
        }
        table.rows = rows;
        table
    }

    /// Creates a table from JSON values, each of which must be an object.
    pub fn from_json_rows(rows: Vec<Value>) -> Result<Self> {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::Object(map) => Ok(map),
                other => Err(CrashDqError::structural_input(
                    format!("rows[{}]", index),
                    format!("expected a JSON object, found {}", json_kind(&other)),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_rows(records))
    }

    /// Returns true if the column is part of the schema.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Appends a column to the schema if it is not already present.
    pub fn ensure_column(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.has_column(&name) {
            self.columns.push(name);
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row.
    pub fn push(&mut self, row: Record) {
        self.rows.push(row);
    }

    /// Reads a cell. Missing keys read as null.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows
            .get(row)
            .map(|record| record.get(column).unwrap_or(&NULL))
    }

    /// Iterates one column top to bottom. Missing keys read as null.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows
            .iter()
            .map(move |record| record.get(column).unwrap_or(&NULL))
    }

    /// Splits the table into at most `shard_count` contiguous shards that
    /// share this table's schema.
    ///
    /// An empty table yields a single empty shard so that downstream
    /// concatenation still sees the schema.
    pub fn split_into_shards(&self, shard_count: usize) -> Vec<Self> {
        let shard_count = shard_count.max(1);
        if self.rows.is_empty() {
            return vec![Self::new(self.columns.iter().cloned())];
        }
        let chunk_size = self.rows.len().div_ceil(shard_count);
        self.rows
            .chunks(chunk_size)
            .map(|chunk| Self::with_rows(self.columns.iter().cloned(), chunk.to_vec()))
            .collect()
    }

    /// Concatenates tables. The schema is the first-seen union of all
    /// schemas; rows keep their order.
    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut out = Self::default();
        for table in tables {
            for column in table.columns {
                out.ensure_column(column);
            }
            out.rows.extend(table.rows);
        }
        out
    }
}

/// Reads a cell as a nullable integer.
///
/// Accepts JSON integers, integral floats and numeric strings. Null, a
/// missing key and a blank string read as `None`. Anything else cannot be
/// coerced and is a structural error for `column`.
pub fn read_nullable_int(value: &Value, column: &str) -> Result<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            n.as_f64().and_then(integral).map(Some).ok_or_else(|| {
                CrashDqError::structural_input(
                    column,
                    format!("value {} is not a representable integer", n),
                )
            })
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            // Float-formatted integers such as "2010.0" are accepted too
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral))
                .map(Some)
                .ok_or_else(|| {
                    CrashDqError::structural_input(
                        column,
                        format!("string '{}' cannot be coerced to an integer", trimmed),
                    )
                })
        }
        other => Err(CrashDqError::structural_input(
            column,
            format!("expected a nullable integer, found {}", json_kind(other)),
        )),
    }
}

/// Finite, integral floats below 9e15 convert exactly.
#[allow(clippy::cast_possible_truncation)]
fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15).then_some(f as i64)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Calendar date identifying a pipeline run, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunDate(NaiveDate);

impl RunDate {
    /// Wraps a calendar date.
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The local calendar date.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// The underlying date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Calendar year of the run.
    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl FromStr for RunDate {
    type Err = CrashDqError;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|e| {
                CrashDqError::configuration(format!(
                    "Invalid run date '{}': expected YYYY-MM-DD ({})",
                    s, e
                ))
            })
    }
}

impl fmt::Display for RunDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl TryFrom<String> for RunDate {
    type Error = CrashDqError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RunDate> for String {
    fn from(value: RunDate) -> Self {
        value.to_string()
    }
}

impl From<NaiveDate> for RunDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

/// On-disk representation of a batch, used by the record source and the
/// sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDocument {
    /// Document format version, currently "1.0"
    pub format_version: String,
    /// Explicit schema; derived from row keys when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    /// Records
    pub rows: Vec<Record>,
}

impl From<BatchDocument> for RecordTable {
    fn from(doc: BatchDocument) -> Self {
        match doc.columns {
            Some(columns) => Self::with_rows(columns, doc.rows),
            None => Self::from_rows(doc.rows),
        }
    }
}

impl From<&RecordTable> for BatchDocument {
    fn from(table: &RecordTable) -> Self {
        Self {
            format_version: BATCH_FORMAT_VERSION.to_string(),
            columns: Some(table.columns.clone()),
            rows: table.rows.clone(),
        }
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
