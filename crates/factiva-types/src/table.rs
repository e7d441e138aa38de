//! Column-oriented tabular results.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::FactivaError;

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Timestamp with millisecond precision.
    Timestamp(DateTime<Utc>),
    /// Nested array or object kept as JSON.
    Json(Value),
}

impl Cell {
    /// Converts a JSON value into a cell.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| n.as_f64().map_or(Self::Null, Self::Float), Self::Int),
            Value::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }

    /// Converts the cell into a JSON value. Timestamps become RFC 3339 strings.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
            Self::Timestamp(ts) => Value::String(format_timestamp(ts)),
            Self::Json(v) => v.clone(),
        }
    }

    /// Returns true if the cell holds no value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text content, if this is a text cell.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the integer content, if this is an integer cell.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the timestamp content, if this is a timestamp cell.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Renders the cell as text. Null renders as an empty string.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Coerces the cell to a millisecond-precision timestamp.
    ///
    /// Integers and floats are read as epoch milliseconds, text as RFC 3339
    /// or a naive `YYYY-MM-DD HH:MM:SS` form in UTC. Returns `None` when the
    /// value cannot be interpreted as a timestamp.
    #[must_use]
    pub fn to_timestamp_millis(&self) -> Option<Self> {
        let ts = match self {
            Self::Null => return Some(Self::Null),
            Self::Int(ms) => DateTime::from_timestamp_millis(*ms)?,
            Self::Float(ms) => DateTime::from_timestamp_millis(*ms as i64)?,
            Self::Timestamp(ts) => *ts,
            Self::Text(s) => parse_timestamp(s)?,
            Self::Bool(_) | Self::Json(_) => return None,
        };
        DateTime::from_timestamp_millis(ts.timestamp_millis()).map(Self::Timestamp)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Timestamp(ts) => write!(f, "{}", format_timestamp(ts)),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column values, one per row.
    pub values: Vec<Cell>,
}

impl Column {
    /// Creates a new column.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Tabular result of a job or a decoded file.
///
/// Columns keep the order in which their names were first seen. Rows that
/// lack a column hold [`Cell::Null`] there.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
            num_rows: 0,
        }
    }

    /// Builds a table from records of `(column, cell)` pairs.
    ///
    /// A repeated column within one record keeps the last value.
    pub fn from_records<I, R, K>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, Cell)>,
        K: Into<String>,
    {
        let mut table = Self::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            let row = table.num_rows;
            for (key, cell) in record {
                let key = key.into();
                let idx = match index.get(&key) {
                    Some(idx) => *idx,
                    None => {
                        table.columns.push(Column::new(key.clone(), vec![Cell::Null; row]));
                        index.insert(key, table.columns.len() - 1);
                        table.columns.len() - 1
                    }
                };
                let values = &mut table.columns[idx].values;
                if values.len() > row {
                    values[row] = cell;
                } else {
                    values.push(cell);
                }
            }
            for column in &mut table.columns {
                if column.values.len() == row {
                    column.values.push(Cell::Null);
                }
            }
            table.num_rows += 1;
        }

        table
    }

    /// Builds a table from columns. Returns `None` if their lengths differ.
    #[must_use]
    pub fn from_columns(columns: Vec<Column>) -> Option<Self> {
        let num_rows = columns.first().map_or(0, |c| c.values.len());
        columns
            .iter()
            .all(|c| c.values.len() == num_rows)
            .then_some(Self { columns, num_rows })
    }

    /// Builds a table from JSON objects.
    pub fn from_json_objects<I>(objects: I) -> Self
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        Self::from_records(
            objects
                .into_iter()
                .map(|object| object.into_iter().map(|(k, v)| (k, Cell::from_json(v)))),
        )
    }

    /// Concatenates tables row-wise, unioning their columns.
    pub fn concat<'a, I>(tables: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        Self::from_records(tables.into_iter().flat_map(Self::owned_rows))
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Returns the columns in order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Returns true if a column with this name exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Returns the column with this name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the position of the column with this name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Returns the cells of the column with this name for in-place edits.
    ///
    /// The slice keeps the column length equal to the row count.
    pub fn column_values_mut(&mut self, name: &str) -> Option<&mut [Cell]> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| c.values.as_mut_slice())
    }

    /// Inserts a column at `index`, or last if `index` is past the end.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the column length differs from the row
    /// count of a table that already has columns, or if the name is taken.
    pub fn insert_column(&mut self, index: usize, column: Column) -> crate::Result<()> {
        if self.has_column(&column.name) {
            return Err(FactivaError::invalid_field(&column.name, "column already exists"));
        }
        if self.columns.is_empty() {
            self.num_rows = column.values.len();
        } else if column.values.len() != self.num_rows {
            return Err(FactivaError::invalid_field(
                &column.name,
                format!(
                    "column has {} values, table has {} rows",
                    column.values.len(),
                    self.num_rows
                ),
            ));
        }
        let index = index.min(self.columns.len());
        self.columns.insert(index, column);
        Ok(())
    }

    /// Removes and returns the column with this name.
    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Removes every listed column that is present.
    pub fn drop_columns(&mut self, names: &[&str]) {
        self.columns.retain(|c| !names.contains(&c.name.as_str()));
    }

    /// Returns a table with only the listed columns, in the listed order.
    ///
    /// Names that are not present are skipped.
    #[must_use]
    pub fn select(&self, names: &[&str]) -> Self {
        let columns = names
            .iter()
            .filter_map(|name| self.column(name).cloned())
            .collect();
        Self {
            columns,
            num_rows: self.num_rows,
        }
    }

    /// Returns the cell at `row` in column `name`.
    #[must_use]
    pub fn get(&self, row: usize, name: &str) -> Option<&Cell> {
        self.column(name)?.values.get(row)
    }

    /// Iterates over rows as `(column, cell)` pairs.
    pub fn rows(&self) -> impl Iterator<Item = Vec<(&str, &Cell)>> + '_ {
        (0..self.num_rows).map(move |row| {
            self.columns
                .iter()
                .map(|c| (c.name.as_str(), &c.values[row]))
                .collect()
        })
    }

    /// Iterates over borrowed row views that serialize as JSON objects.
    pub fn json_rows(&self) -> impl ExactSizeIterator<Item = Row<'_>> + '_ {
        (0..self.num_rows).map(move |index| Row { table: self, index })
    }

    /// Converts the table into JSON objects, one per row.
    #[must_use]
    pub fn to_json_records(&self) -> Vec<Map<String, Value>> {
        self.rows()
            .map(|row| {
                row.into_iter()
                    .map(|(name, cell)| (name.to_string(), cell.to_json()))
                    .collect()
            })
            .collect()
    }

    fn owned_rows(&self) -> Vec<Vec<(String, Cell)>> {
        self.rows()
            .map(|row| {
                row.into_iter()
                    .map(|(name, cell)| (name.to_string(), cell.clone()))
                    .collect()
            })
            .collect()
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.json_rows())
    }
}

/// One row of a [`Table`], borrowed in column order.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    /// Position of the row in its table.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the cell in column `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a Cell> {
        self.table.get(self.index, name)
    }

    /// Iterates over `(column, cell)` pairs.
    pub fn cells(&self) -> impl Iterator<Item = (&'a str, &'a Cell)> + 'a {
        let index = self.index;
        self.table
            .columns
            .iter()
            .map(move |c| (c.name.as_str(), &c.values[index]))
    }
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.cells())
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Table {} rows x {} columns [{}]>",
            self.num_rows,
            self.columns.len(),
            self.column_names().join(", ")
        )
    }
}
