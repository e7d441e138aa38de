//! Core types for the Factiva Analytics client.
//!
//! This crate provides the fundamental data structures used throughout the workspace:
//!
//! - [`FactivaError`] - Error taxonomy shared by every job operation
//! - [`JobState`] - Closed set of server-side job states with a transition table
//! - [`Endpoint`] - Job endpoint kinds with their per-endpoint validation rules
//! - [`Frequency`] and [`DateField`] - Time-series aggregation options
//! - [`Table`] - Tabular job results
//! - [`Settings`] - Configuration snapshot resolved once from the environment

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factiva-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod endpoint;
mod error;
pub mod fields;
mod job_state;
mod table;

pub use config::{
    API_HOST_ENV, DEFAULT_API_HOST, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, MAX_POLLS_ENV,
    MAX_WAIT_ENV, POLL_INTERVAL_ENV, Settings, USER_KEY_ENV, WHERE_ENV,
};
pub use endpoint::{Endpoint, FieldRule, JobIdRule};
pub use error::{FactivaError, Result};
pub use fields::{DateField, Frequency};
pub use job_state::JobState;
pub use table::{Cell, Column, Row, Table};
