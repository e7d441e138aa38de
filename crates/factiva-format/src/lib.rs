//! Result decoding and table output for the Factiva Analytics client.
//!
//! - [`ResultDecoder`] - Inline JSON, JSON lines and Avro snapshot files into a [`Table`](factiva_types::Table)
//! - [`read_raw_avro`] - Avro files with no snapshot rules
//! - [`CsvFormatter`] - CSV/TSV format
//! - [`JsonFormatter`] - JSON array or NDJSON format
//! - [`ParquetFormatter`] - Apache Parquet columnar format

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factiva-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod avro;
mod csv;
mod decode;
mod files;
mod formatter;
mod json;

#[cfg(feature = "parquet")]
mod parquet;

pub use crate::csv::CsvFormatter;
pub use decode::{DecodeError, ResultDecoder, ResultFormat, decode_inline, decode_json_lines};
pub use files::read_raw_avro;
pub use formatter::{FormatError, Formatter, OutputFormat, write_table};
pub use json::{JsonFormatter, JsonStyle};

#[cfg(feature = "parquet")]
pub use crate::parquet::ParquetFormatter;
