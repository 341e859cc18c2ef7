//! In-memory tabular data.
//!
//! `Table` is the interchange format between the data-request pipeline, the
//! filter engine and the fingerprint encoder. Tables are never edited in
//! place by those stages: every transformation returns a new table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Result, ScreenError};

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Interpret a CSV field: empty → Null, then integer, float, bool, text.
    pub fn parse_field(field: &str) -> Self {
        if field.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = field.parse::<i64>() {
            return Value::Int(i);
        }
        // "inf" / "nan" parse as floats; keep them as text
        if field.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(f) = field.parse::<f64>() {
                return Value::Float(f);
            }
        }
        match field {
            "true" | "True" => Value::Bool(true),
            "false" | "False" => Value::Bool(false),
            _ => Value::Text(field.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Text(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::Text(s) }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self { Value::Float(x) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Int(i) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Ordered columns plus rows of cells. Every row has one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from rows, checking every row's width.
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ScreenError::Validation(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like `column_index`, but a missing column is a validation error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| {
            ScreenError::Validation(format!("column '{name}' is not in the table"))
        })
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let col = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| &r[col]).collect())
    }

    /// A new table with the rows at `indices`, in that order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().filter_map(|&i| self.rows.get(i).cloned()).collect(),
        }
    }

    /// A new table restricted to `columns`, in the given order.
    pub fn select(&self, columns: &[&str]) -> Result<Table> {
        let idx = columns
            .iter()
            .map(|c| self.require_column(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| idx.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }

    /// A new table with extra columns appended. `values` holds one row of
    /// new cells per existing row.
    pub fn with_columns(&self, names: &[String], values: Vec<Vec<Value>>) -> Result<Table> {
        self.check_new_columns(names)?;
        if values.len() != self.rows.len() {
            return Err(ScreenError::Validation(format!(
                "{} value rows for a table of {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        let mut columns = self.columns.clone();
        columns.extend(names.iter().cloned());
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, extra)| {
                if extra.len() != names.len() {
                    return Err(ScreenError::Validation(format!(
                        "{} new cells for {} new columns",
                        extra.len(),
                        names.len()
                    )));
                }
                let mut r = row.clone();
                r.extend(extra);
                Ok(r)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Table { columns, rows })
    }

    /// Fails when any of `names` is already a column or repeats within `names`.
    pub fn check_new_columns(&self, names: &[String]) -> Result<()> {
        for (i, name) in names.iter().enumerate() {
            if self.column_index(name).is_some() || names[..i].contains(name) {
                return Err(ScreenError::Validation(format!("column '{name}' already exists")));
            }
        }
        Ok(())
    }

    /// A new table with a single column appended.
    pub fn with_column(&self, name: &str, values: Vec<Value>) -> Result<Table> {
        self.with_columns(&[name.to_string()], values.into_iter().map(|v| vec![v]).collect())
    }

    // ── CSV ───────────────────────────────────────────────────────────────────

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Table> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let mut table = Table::new(headers);
        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(Value::parse_field).collect())?;
        }
        Ok(table)
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Table> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_csv_writer(file)
    }
}
