//! Error types for the Factiva Analytics client.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for Factiva operations.
pub type Result<T> = std::result::Result<T, FactivaError>;

/// Errors that can occur while building queries and tracking jobs.
#[derive(Error, Debug)]
pub enum FactivaError {
    /// A field or value was rejected locally, or the server rejected a job lookup.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The server rejected the submitted query payload (HTTP 400 at submit).
    #[error("Invalid query: {0}")]
    Query(String),

    /// The job does not exist on the server (HTTP 404 at poll).
    #[error("Job ID does not exist: {0}")]
    NotFound(String),

    /// The server answered with a status the client does not handle.
    #[error("API request returned an unexpected HTTP status {status}, with content [{body}]")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The server reported a job state outside the known vocabulary, or an
    /// illegal transition out of a terminal state.
    #[error("Unexpected job state: {0}")]
    UnexpectedState(String),

    /// The results file could not be fetched after the job reported success.
    #[error("Results file download error (HTTP {status}): [{body}]")]
    Download {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// No credential was available for an authenticated request.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The operation is not valid in the current job lifecycle phase.
    #[error("Invalid job state for operation: {0}")]
    State(String),

    /// The job did not reach a terminal state within the configured bounds.
    #[error("Job did not complete after {polls} polls ({elapsed:?})")]
    Timeout {
        /// Number of status requests issued.
        polls: u32,
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// The underlying HTTP transport failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A results payload could not be decoded into a table.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A configuration value could not be resolved.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization or parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FactivaError {
    /// Builds a validation error naming the offending field.
    pub fn invalid_field(field: &str, reason: impl std::fmt::Display) -> Self {
        Self::Validation(format!("{field}: {reason}"))
    }
}
