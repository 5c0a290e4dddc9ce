use chrono::NaiveDate;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::constants::DEFAULT_OUTPUT_DATE_FORMAT;

/// A single cell after loading or after a pipeline stage has typed it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Date(NaiveDate),
    Number(f64),
    Null,
}

impl Value {
    /// Blank cells load as `Null`, everything else as untyped text.
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Value::Null
        } else {
            Value::Text(raw.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Key used when this value identifies a group (order, customer).
    /// Numeric keys render without a trailing `.0` so `77202` and `77202.0` agree.
    pub fn group_key(&self) -> Option<String> {
        match self {
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Value::Null => None,
        }
    }

    /// Text form written to CSV output. Nulls become empty cells.
    pub fn render(&self, date_format: &str) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format(date_format).to_string(),
            Value::Number(n) => n.to_string(),
            Value::Null => String::new(),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Date(d) => {
                serializer.serialize_str(&d.format(DEFAULT_OUTPUT_DATE_FORMAT).to_string())
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Null => serializer.serialize_none(),
        }
    }
}

/// An ordered table of records sharing one set of named columns.
///
/// Stages never mutate a dataset they were handed; they return a new one built
/// through [`Dataset::with_column`] or [`Dataset::filter`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a dataset from string literals, mostly for tests and fixtures.
    pub fn from_text_rows(name: &str, columns: &[&str], rows: &[&[&str]]) -> Self {
        let mut dataset = Self::new(name, columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            dataset.push_row(row.iter().map(|raw| Value::from_raw(raw)).collect());
        }
        dataset
    }

    /// Appends a row, padding short rows with `Null` and dropping extra cells.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |values| Record {
            columns: &self.columns,
            values,
        })
    }

    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|values| Record {
            columns: &self.columns,
            values,
        })
    }

    /// All values of one column in record order, or `None` if the column is absent.
    pub fn column_values(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Returns a copy with `column` replaced by `values`, appending the column if absent.
    ///
    /// `values` must hold one entry per record.
    pub fn with_column(&self, column: &str, values: Vec<Value>) -> Dataset {
        assert_eq!(
            values.len(),
            self.rows.len(),
            "column '{column}' must have one value per record"
        );
        let mut next = self.clone();
        match next.column_index(column) {
            Some(idx) => {
                for (row, value) in next.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                next.columns.push(column.to_string());
                for (row, value) in next.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        next
    }

    /// Returns a copy with `f` applied to every value of `column`, or `None` if absent.
    pub fn map_column<F>(&self, column: &str, mut f: F) -> Option<Dataset>
    where
        F: FnMut(&Value) -> Value,
    {
        let idx = self.column_index(column)?;
        let mut next = self.clone();
        for row in next.rows.iter_mut() {
            row[idx] = f(&row[idx]);
        }
        Some(next)
    }

    pub fn filter<P>(&self, mut predicate: P) -> Dataset
    where
        P: FnMut(&Record<'_>) -> bool,
    {
        let mut next = Dataset::new(self.name.clone(), self.columns.clone());
        for record in self.records() {
            if predicate(&record) {
                next.rows.push(record.values.to_vec());
            }
        }
        next
    }

    /// Keeps only the named columns, in the order given. Names not present are skipped.
    pub fn project(&self, columns: &[&str]) -> Dataset {
        let indices: Vec<(usize, &str)> = columns
            .iter()
            .filter_map(|c| self.column_index(c).map(|idx| (idx, *c)))
            .collect();
        let mut next = Dataset::new(
            self.name.clone(),
            indices.iter().map(|(_, c)| c.to_string()).collect(),
        );
        for row in &self.rows {
            next.rows
                .push(indices.iter().map(|(idx, _)| row[*idx].clone()).collect());
        }
        next
    }

    /// First `n` records, for previews.
    pub fn head(&self, n: usize) -> Dataset {
        let mut next = Dataset::new(self.name.clone(), self.columns.clone());
        next.rows = self.rows.iter().take(n).cloned().collect();
        next
    }
}

/// Serialized as a list of `{column: value}` objects.
impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}

/// Borrowed view of one row, addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let values = self.values;
        self.columns
            .iter()
            .position(|c| c == column)
            .map(move |idx| &values[idx])
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
