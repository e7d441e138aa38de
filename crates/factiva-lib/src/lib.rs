//! Rust client for the Factiva Analytics APIs.
//!
//! This is a facade crate that re-exports functionality from the factiva
//! workspace crates for convenient access.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factiva-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use factiva_types::*;

// Re-export query builders
pub use factiva_query::{
    DEFAULT_TOP, ExplainQuery, ExtractionFormat, ExtractionQuery, FieldFilter, JobQuery,
    SnapshotQuery, TimeSeriesQuery, default_query,
};

// Re-export transport and credentials
pub use factiva_fetch::{
    ClientConfig, Credential, HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport,
    TransportError, USER_KEY_LEN, UserKey, url,
};

#[cfg(feature = "mock")]
pub use factiva_fetch::MockTransport;

// Re-export the job runner
pub use factiva_jobs::{JobError, JobResponse, JobRunner, JobRunnerBuilder, RunnerConfig};

// Re-export decoding and formatters
pub use factiva_format::{
    CsvFormatter, DecodeError, FormatError, Formatter, JsonFormatter, JsonStyle, OutputFormat,
    ResultDecoder, ResultFormat, avro, decode_inline, decode_json_lines, read_raw_avro,
    write_table,
};

#[cfg(feature = "parquet")]
pub use factiva_format::ParquetFormatter;

/// Prelude module for convenient imports.
///
/// ```
/// use factiva_lib::prelude::*;
/// ```
pub mod prelude {
    pub use factiva_types::{
        Cell, DateField, Endpoint, FactivaError, Frequency, JobState, Result, Settings, Table,
    };

    pub use factiva_query::{ExplainQuery, ExtractionQuery, JobQuery, TimeSeriesQuery};

    pub use factiva_fetch::{ReqwestTransport, Transport, UserKey};

    pub use factiva_jobs::{JobResponse, JobRunner, RunnerConfig};

    pub use factiva_format::{Formatter, OutputFormat, ResultDecoder, write_table};
}
