//! Query builders for Factiva Analytics jobs.
//!
//! - [`SnapshotQuery`] - `where` clause plus include/exclude filters
//! - [`ExplainQuery`] - Document volume estimate
//! - [`TimeSeriesQuery`] - Aggregation by frequency, date field and group dimension
//! - [`ExtractionQuery`] - Snapshot extraction with a file format and limit
//! - [`JobQuery`] - Payload contract used by the job runner

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factiva-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod base;
mod explain;
mod extraction;
mod job_query;
mod time_series;

pub use base::{FieldFilter, SnapshotQuery};
pub use explain::ExplainQuery;
pub use extraction::{ExtractionFormat, ExtractionQuery};
pub use job_query::{JobQuery, default_query};
pub use time_series::{DEFAULT_TOP, TimeSeriesQuery};
