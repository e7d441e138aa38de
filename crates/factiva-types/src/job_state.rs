//! Server-side job states.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::FactivaError;

/// State of an asynchronous job as reported by the API.
///
/// The server spells states either as `JOB_<NAME>` or `JOB_STATE_<NAME>`;
/// both spellings parse to the same variant. Anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum JobState {
    /// Job accepted and registered.
    Created,
    /// Job waiting for a worker.
    Queued,
    /// Query validation in progress.
    Validating,
    /// Query validated.
    Validated,
    /// Job pending execution.
    Pending,
    /// Job waiting on an upstream dependency.
    Waiting,
    /// Job executing.
    Running,
    /// Job processing results.
    Processing,
    /// Aggregates being calculated.
    Calculating,
    /// Documents being counted.
    Counting,
    /// Job finished successfully.
    Done,
    /// Job failed.
    Failed,
}

impl JobState {
    /// Returns true for `Done` and `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the job finished successfully.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns whether a job may move from this state to `next`.
    ///
    /// Non-terminal states may move anywhere. Terminal states only repeat.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        !self.is_terminal() || *self == next
    }

    /// Returns the canonical wire spelling of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "JOB_CREATED",
            Self::Queued => "JOB_QUEUED",
            Self::Validating => "JOB_VALIDATING",
            Self::Validated => "JOB_VALIDATED",
            Self::Pending => "JOB_STATE_PENDING",
            Self::Waiting => "JOB_STATE_WAITING",
            Self::Running => "JOB_STATE_RUNNING",
            Self::Processing => "JOB_PROCESSING",
            Self::Calculating => "JOB_CALCULATING",
            Self::Counting => "JOB_COUNTING",
            Self::Done => "JOB_STATE_DONE",
            Self::Failed => "JOB_STATE_FAILED",
        }
    }

    /// Returns every known state.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Created,
            Self::Queued,
            Self::Validating,
            Self::Validated,
            Self::Pending,
            Self::Waiting,
            Self::Running,
            Self::Processing,
            Self::Calculating,
            Self::Counting,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobState {
    type Err = FactivaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let name = upper
            .strip_prefix("JOB_STATE_")
            .or_else(|| upper.strip_prefix("JOB_"))
            .unwrap_or(&upper);

        match name {
            "CREATED" => Ok(Self::Created),
            "QUEUED" => Ok(Self::Queued),
            "VALIDATING" => Ok(Self::Validating),
            "VALIDATED" => Ok(Self::Validated),
            "PENDING" => Ok(Self::Pending),
            "WAITING" => Ok(Self::Waiting),
            "RUNNING" => Ok(Self::Running),
            "PROCESSING" => Ok(Self::Processing),
            "CALCULATING" => Ok(Self::Calculating),
            "COUNTING" => Ok(Self::Counting),
            "DONE" => Ok(Self::Done),
            "FAILED" => Ok(Self::Failed),
            _ => Err(FactivaError::UnexpectedState(s.to_string())),
        }
    }
}

impl TryFrom<String> for JobState {
    type Error = FactivaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        state.as_str().to_string()
    }
}
