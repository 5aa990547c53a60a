//! Tabular input model
//!
//! A [`Table`] is the already-decoded form of an uploaded metrics file:
//! ordered columns, row-major cells, values typed as numbers, text, or
//! dates. The table is built once by the caller and never mutated by the
//! analysis pipeline; every accessor borrows.

use chrono::NaiveDate;
use serde::Serialize;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Null,
}

impl Value {
    /// Coerce to a number the way the analysis stages do: numbers pass
    /// through, numeric-looking text parses, everything else is missing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Interpret as a calendar date. Text cells are tried against a fixed
    /// set of formats; numbers never date-parse.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => parse_date(s.trim()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Stringified form used for segment names and cardinality counts.
    pub fn to_display(&self) -> String {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Null => String::new(),
        }
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Parse a date string against the supported formats, trying an RFC 3339
/// timestamp prefix last.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    // "2024-03-01T12:00:00" and friends
    if s.len() >= 10 {
        if let Ok(d) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
            return Some(d);
        }
    }
    None
}

/// An immutable table of decoded cells.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table from column names and row-major cells. Short rows are
    /// padded with nulls, long rows truncated, so every row matches the
    /// header width.
    pub fn new(columns: Vec<String>, mut rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        for row in &mut rows {
            row.resize(width, Value::Null);
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of a column, in row order. Empty iterator for unknown names.
    pub fn column(&self, name: &str) -> impl Iterator<Item = &Value> {
        let idx = self.column_index(name);
        self.rows.iter().filter_map(move |row| idx.map(|i| &row[i]))
    }

    /// Non-missing numeric values of a column with their row indices.
    pub fn numeric_values(&self, name: &str) -> Vec<(usize, f64)> {
        let Some(idx) = self.column_index(name) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| row[idx].as_number().map(|n| (i, n)))
            .collect()
    }

    /// Dtype-style check: a column is numeric when it holds no text and no
    /// date cells. A fully-null column counts as numeric, matching the
    /// float-dtype default of the source data frames.
    pub fn is_numeric_column(&self, name: &str) -> bool {
        self.column(name)
            .all(|v| matches!(v, Value::Number(_) | Value::Null))
    }

    /// True when the column holds at least one text cell.
    pub fn is_text_column(&self, name: &str) -> bool {
        self.column(name).any(|v| matches!(v, Value::Text(_)))
    }

    /// Every non-null cell parses as a date, and there is at least one.
    pub fn parses_as_dates(&self, name: &str) -> bool {
        let mut seen = 0usize;
        for v in self.column(name) {
            if v.is_null() {
                continue;
            }
            if v.as_date().is_none() {
                return false;
            }
            seen += 1;
        }
        seen > 0
    }

    /// Number of distinct non-null values, by display form.
    pub fn cardinality(&self, name: &str) -> usize {
        let mut seen: Vec<String> = self
            .column(name)
            .filter(|v| !v.is_null())
            .map(|v| v.to_display())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    pub fn cell(&self, row: usize, col: &str) -> Option<&Value> {
        let idx = self.column_index(col)?;
        self.rows.get(row).map(|r| &r[idx])
    }
}
