//! Avro row-table reading.

use apache_avro::Reader;
use apache_avro::types::Value as AvroValue;
use chrono::DateTime;
use factiva_types::{Cell, Table};

use crate::DecodeError;

/// Reads every record of an Avro object container into a table, with no rules applied.
///
/// # Errors
///
/// Returns an error if the container is malformed or holds non-record values.
pub fn read_avro(raw: &[u8]) -> Result<Table, DecodeError> {
    let reader = Reader::new(raw).map_err(avro_error)?;
    let mut records = Vec::new();
    for value in reader {
        records.push(record_cells(value.map_err(avro_error)?)?);
    }
    Ok(Table::from_records(records))
}

fn record_cells(value: AvroValue) -> Result<Vec<(String, Cell)>, DecodeError> {
    match value {
        AvroValue::Record(fields) => fields
            .into_iter()
            .map(|(name, value)| Ok((name, to_cell(value)?)))
            .collect(),
        AvroValue::Union(_, inner) => record_cells(*inner),
        other => Err(DecodeError::Shape(format!(
            "expected an Avro record, found {other:?}"
        ))),
    }
}

/// Converts an Avro value into a cell.
///
/// Timestamp logical types become timestamps; records, arrays and maps are kept as JSON.
///
/// # Errors
///
/// Returns an error for values with no JSON representation or out-of-range timestamps.
pub fn to_cell(value: AvroValue) -> Result<Cell, DecodeError> {
    let cell = match value {
        AvroValue::Null => Cell::Null,
        AvroValue::Boolean(b) => Cell::Bool(b),
        AvroValue::Int(i) => Cell::Int(i64::from(i)),
        AvroValue::Long(i) => Cell::Int(i),
        AvroValue::Float(f) => Cell::Float(f64::from(f)),
        AvroValue::Double(f) => Cell::Float(f),
        AvroValue::String(s) | AvroValue::Enum(_, s) => Cell::Text(s),
        AvroValue::TimestampMillis(ms) | AvroValue::LocalTimestampMillis(ms) => {
            DateTime::from_timestamp_millis(ms)
                .map(Cell::Timestamp)
                .ok_or_else(|| out_of_range(ms))?
        }
        AvroValue::TimestampMicros(us) | AvroValue::LocalTimestampMicros(us) => {
            DateTime::from_timestamp_micros(us)
                .map(Cell::Timestamp)
                .ok_or_else(|| out_of_range(us))?
        }
        AvroValue::Union(_, inner) => to_cell(*inner)?,
        other => Cell::from_json(serde_json::Value::try_from(other).map_err(avro_error)?),
    };
    Ok(cell)
}

fn avro_error(err: apache_avro::Error) -> DecodeError {
    DecodeError::Avro(err.to_string())
}

fn out_of_range(value: i64) -> DecodeError {
    DecodeError::Avro(format!("timestamp {value} is out of range"))
}
