//! Apache Parquet output format.

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use factiva_types::{Cell, Column, Table};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::io::Write;
use std::sync::Arc;

use crate::{FormatError, Formatter};

/// Parquet formatter.
///
/// Each column's Arrow type is inferred from its non-null cells: integers
/// become `Int64`, mixed integers and floats `Float64`, booleans `Boolean`,
/// timestamps `Timestamp(ms, UTC)`. Anything else is written as text.
#[derive(Debug, Clone)]
pub struct ParquetFormatter {
    /// Row group size (number of rows per group).
    row_group_size: usize,
    /// Compression codec.
    compression: Compression,
}

impl Default for ParquetFormatter {
    fn default() -> Self {
        Self {
            row_group_size: 100_000,
            compression: Compression::SNAPPY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Int,
    Float,
    Bool,
    Timestamp,
    Text,
}

impl Kind {
    fn infer(column: &Column) -> Self {
        let mut kind: Option<Self> = None;
        for cell in column.values.iter().filter(|c| !c.is_null()) {
            let next = match cell {
                Cell::Int(_) => Self::Int,
                Cell::Float(_) => Self::Float,
                Cell::Bool(_) => Self::Bool,
                Cell::Timestamp(_) => Self::Timestamp,
                _ => Self::Text,
            };
            kind = Some(match (kind, next) {
                (None, next) => next,
                (Some(a), b) if a == b => a,
                (Some(Self::Int | Self::Float), Self::Int | Self::Float) => Self::Float,
                _ => return Self::Text,
            });
        }
        kind.unwrap_or(Self::Text)
    }

    fn data_type(self) -> DataType {
        match self {
            Self::Int => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::Bool => DataType::Boolean,
            Self::Timestamp => DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            Self::Text => DataType::Utf8,
        }
    }

    fn array(self, values: &[Cell]) -> ArrayRef {
        match self {
            Self::Int => Arc::new(Int64Array::from(
                values.iter().map(Cell::as_i64).collect::<Vec<_>>(),
            )),
            Self::Float => Arc::new(Float64Array::from(
                values
                    .iter()
                    .map(|c| match c {
                        Cell::Float(f) => Some(*f),
                        Cell::Int(i) => Some(*i as f64),
                        _ => None,
                    })
                    .collect::<Vec<_>>(),
            )),
            Self::Bool => Arc::new(BooleanArray::from(
                values
                    .iter()
                    .map(|c| match c {
                        Cell::Bool(b) => Some(*b),
                        _ => None,
                    })
                    .collect::<Vec<_>>(),
            )),
            Self::Timestamp => Arc::new(
                TimestampMillisecondArray::from(
                    values
                        .iter()
                        .map(|c| c.as_timestamp().map(|ts| ts.timestamp_millis()))
                        .collect::<Vec<_>>(),
                )
                .with_timezone("UTC"),
            ),
            Self::Text => Arc::new(StringArray::from(
                values
                    .iter()
                    .map(|c| (!c.is_null()).then(|| c.to_text()))
                    .collect::<Vec<_>>(),
            )),
        }
    }
}

impl ParquetFormatter {
    /// Creates a new Parquet formatter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row group size.
    #[must_use]
    pub const fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Sets the compression codec.
    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Infers the Arrow schema of a table.
    fn table_schema(table: &Table) -> Schema {
        Schema::new(
            table
                .columns()
                .iter()
                .map(|c| Field::new(c.name.as_str(), Kind::infer(c).data_type(), true))
                .collect::<Vec<_>>(),
        )
    }

    /// Converts a table to an Arrow RecordBatch.
    fn table_to_batch(table: &Table, schema: Arc<Schema>) -> Result<RecordBatch, FormatError> {
        let arrays = table
            .columns()
            .iter()
            .map(|c| Kind::infer(c).array(&c.values))
            .collect();
        RecordBatch::try_new(schema, arrays).map_err(|e| FormatError::Parquet(e.to_string()))
    }
}

impl Formatter for ParquetFormatter {
    fn write_table<W: Write + Send>(&self, table: &Table, writer: W) -> Result<(), FormatError> {
        if table.num_columns() == 0 {
            return Err(FormatError::Parquet("table has no columns".into()));
        }

        let schema = Arc::new(Self::table_schema(table));
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut arrow_writer = ArrowWriter::try_new(writer, Arc::clone(&schema), Some(props))
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        let batch = Self::table_to_batch(table, schema)?;
        arrow_writer
            .write(&batch)
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        arrow_writer
            .close()
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        Ok(())
    }

    fn extension(&self) -> &str {
        "parquet"
    }
}
