//! Job lifecycle for the Factiva Analytics client.
//!
//! - [`JobRunner`] - Submit, poll, wait and download
//! - [`JobRunnerBuilder`] - Query or job id, credential and config for a runner
//! - [`JobResponse`] - State, links, errors and results of one job
//! - [`RunnerConfig`] - Host and wait-loop bounds

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/factiva-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod response;
mod runner;

pub use config::RunnerConfig;
pub use response::{JobError, JobResponse};
pub use runner::{JobRunner, JobRunnerBuilder};
