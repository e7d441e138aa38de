//! Result decoding into tables.

use factiva_types::fields::{SNAPSHOT_FILE_DELETE_FIELDS, SNAPSHOT_FILE_STATS_FIELDS, TIMESTAMP_FIELDS};
use factiva_types::{Cell, Column, FactivaError, Table};
use serde_json::Value;
use thiserror::Error;

use crate::avro::read_avro;

/// Errors that can occur while decoding results.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Malformed JSON document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed line in a JSON-lines payload.
    #[error("Invalid JSON on line {line}: {source}")]
    JsonLine {
        /// One-based line number.
        line: usize,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The payload is not valid UTF-8.
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Malformed Avro container.
    #[error("Avro error: {0}")]
    Avro(String),

    /// The payload parsed but is not tabular.
    #[error("Unexpected results shape: {0}")]
    Shape(String),

    /// A timestamp column holds a value that is not a timestamp.
    #[error("Column '{column}' row {row} is not a timestamp: {value}")]
    Timestamp {
        /// Column name.
        column: String,
        /// Zero-based row.
        row: usize,
        /// Offending value.
        value: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DecodeError> for FactivaError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Io(e) => Self::Io(e),
            other => Self::Decode(other.to_string()),
        }
    }
}

/// Raw results encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultFormat {
    /// JSON document: an array of records or an object of columns.
    InlineJson,
    /// Newline-delimited JSON, one record per line.
    JsonLines,
    /// Avro object container of article records.
    Avro,
}

/// Decodes job results into tables.
///
/// The snapshot options only affect Avro input:
///
/// - `stats_only` keeps the metadata columns
/// - `merge_body` prepends `snippet` to `body` and drops `snippet`
/// - `all_fields` skips projection, merge and deprecated-field removal
///
/// Known timestamp columns are always coerced to millisecond precision.
/// Decoding is pure: the same input always yields the same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultDecoder {
    stats_only: bool,
    merge_body: bool,
    all_fields: bool,
}

impl ResultDecoder {
    /// Creates a decoder with every option off.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stats_only: false,
            merge_body: false,
            all_fields: false,
        }
    }

    /// Keeps only the metadata columns of snapshot files.
    #[must_use]
    pub const fn with_stats_only(mut self, stats_only: bool) -> Self {
        self.stats_only = stats_only;
        self
    }

    /// Merges `snippet` into `body`.
    #[must_use]
    pub const fn with_merge_body(mut self, merge_body: bool) -> Self {
        self.merge_body = merge_body;
        self
    }

    /// Keeps every column of snapshot files.
    #[must_use]
    pub const fn with_all_fields(mut self, all_fields: bool) -> Self {
        self.all_fields = all_fields;
        self
    }

    /// Decodes `raw` in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is malformed or not tabular.
    pub fn decode(&self, raw: &[u8], format: ResultFormat) -> Result<Table, DecodeError> {
        match format {
            ResultFormat::InlineJson => decode_inline(&serde_json::from_slice(raw)?),
            ResultFormat::JsonLines => decode_json_lines(raw),
            ResultFormat::Avro => self.apply_snapshot_rules(read_avro(raw)?),
        }
    }

    /// Applies the snapshot file rules to a table read from a row-table file.
    ///
    /// # Errors
    ///
    /// Returns an error if a timestamp column cannot be coerced.
    pub fn apply_snapshot_rules(&self, table: Table) -> Result<Table, DecodeError> {
        let mut table = table;
        if self.all_fields {
            body_as_text(&mut table);
        } else {
            if self.stats_only {
                table = table.select(SNAPSHOT_FILE_STATS_FIELDS);
            } else {
                if self.merge_body {
                    merge_snippet(&mut table)?;
                }
                body_as_text(&mut table);
            }
            table.drop_columns(SNAPSHOT_FILE_DELETE_FIELDS);
        }
        coerce_timestamps(&mut table)?;
        Ok(table)
    }
}

/// Decodes an inline `results` value.
///
/// # Errors
///
/// Returns a shape error unless `value` is an array of objects or an object of
/// equal-length arrays.
pub fn decode_inline(value: &Value) -> Result<Table, DecodeError> {
    match value {
        Value::Array(items) => {
            let objects = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_object().cloned().ok_or_else(|| {
                        DecodeError::Shape(format!("result {i} is not an object"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Table::from_json_objects(objects))
        }
        Value::Object(columns) => {
            let columns = columns
                .iter()
                .map(|(name, values)| {
                    values
                        .as_array()
                        .map(|values| {
                            Column::new(name.clone(), values.iter().cloned().map(Cell::from_json).collect())
                        })
                        .ok_or_else(|| DecodeError::Shape(format!("column '{name}' is not an array")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Table::from_columns(columns)
                .ok_or_else(|| DecodeError::Shape("columns have different lengths".into()))
        }
        other => Err(DecodeError::Shape(format!(
            "expected an array or object, found {other}"
        ))),
    }
}

/// Decodes newline-delimited JSON records. Blank lines are skipped.
///
/// # Errors
///
/// Returns an error if the payload is not UTF-8, or naming the first line
/// that is not a JSON object.
pub fn decode_json_lines(raw: &[u8]) -> Result<Table, DecodeError> {
    let text = std::str::from_utf8(raw)?;
    let mut objects = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .map_err(|source| DecodeError::JsonLine { line: i + 1, source })?;
        match value {
            Value::Object(object) => objects.push(object),
            other => {
                return Err(DecodeError::Shape(format!(
                    "line {} is not an object: {other}",
                    i + 1
                )));
            }
        }
    }
    Ok(Table::from_json_objects(objects))
}

fn merge_snippet(table: &mut Table) -> Result<(), DecodeError> {
    let Some(snippet) = table.remove_column("snippet") else {
        return Ok(());
    };
    let rows = table.num_rows();
    let position = table.column_index("body").unwrap_or(table.num_columns());
    let body = table
        .remove_column("body")
        .map_or_else(|| vec![Cell::Null; rows], |c| c.values);
    let merged = snippet
        .values
        .iter()
        .zip(&body)
        .map(|(snippet, body)| Cell::Text(format!("{}\n\n{}", snippet.to_text(), body.to_text())))
        .collect();
    table
        .insert_column(position, Column::new("body", merged))
        .map_err(|e| DecodeError::Shape(e.to_string()))
}

fn body_as_text(table: &mut Table) {
    if let Some(body) = table.column_values_mut("body") {
        for cell in body {
            if !matches!(cell, Cell::Text(_)) {
                *cell = Cell::Text(cell.to_text());
            }
        }
    }
}

fn coerce_timestamps(table: &mut Table) -> Result<(), DecodeError> {
    for field in TIMESTAMP_FIELDS {
        let Some(values) = table.column_values_mut(field) else {
            continue;
        };
        for (row, cell) in values.iter_mut().enumerate() {
            *cell = cell.to_timestamp_millis().ok_or_else(|| DecodeError::Timestamp {
                column: (*field).to_string(),
                row,
                value: cell.to_text(),
            })?;
        }
    }
    Ok(())
}
