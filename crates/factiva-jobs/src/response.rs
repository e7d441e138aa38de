//! Job response record and the wire envelope it is read from.

use factiva_types::{JobState, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Job ids at least this long are masked by `Display`.
const MASK_THRESHOLD: usize = 40;

/// Trailing characters of a masked job id left visible.
const MASK_VISIBLE: usize = 10;

/// An error reported by the server alongside a job state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    /// Short error title.
    #[serde(default)]
    pub title: String,
    /// Error detail.
    #[serde(default)]
    pub detail: String,
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.detail)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub(crate) data: Option<EnvelopeData>,
    #[serde(default)]
    pub(crate) links: Option<Links>,
    #[serde(default)]
    pub(crate) errors: Option<Vec<JobError>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EnvelopeData {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) attributes: Attributes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Attributes {
    #[serde(default)]
    pub(crate) current_state: Option<String>,
    #[serde(default)]
    pub(crate) results: Option<Value>,
    #[serde(default)]
    pub(crate) download_link: Option<String>,
    #[serde(default)]
    pub(crate) counts: Option<i64>,
    #[serde(default)]
    pub(crate) files: Option<Vec<FileRef>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileRef {
    pub(crate) uri: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Links {
    #[serde(rename = "self", default)]
    pub(crate) self_link: Option<String>,
}

impl Envelope {
    pub(crate) fn current_state(&self) -> Option<&str> {
        self.data.as_ref()?.attributes.current_state.as_deref()
    }

    pub(crate) fn self_link(&self) -> Option<String> {
        self.links.as_ref()?.self_link.clone()
    }
}

/// Mutable record of one job, owned by the runner tracking it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobResponse {
    /// Server-assigned job identifier.
    pub job_id: String,
    /// Canonical polling URL, set by every successful submit or poll.
    pub job_link: Option<String>,
    /// Latest known state.
    pub job_state: Option<JobState>,
    /// Results, once the job is done and they were inline or downloaded.
    pub data: Option<Table>,
    /// Link to a results file too large to return inline.
    pub download_link: Option<String>,
    /// Errors the server reported with the state.
    pub errors: Option<Vec<JobError>>,
    /// Estimated document count of an explain job.
    pub counts: Option<i64>,
    /// Result file URIs of an extraction job.
    pub files: Option<Vec<String>>,
}

impl JobResponse {
    /// Creates a response holding only a job id.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            ..Self::default()
        }
    }

    /// Returns true once the job is `DONE` or `FAILED`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.job_state.is_some_and(|s| s.is_terminal())
    }

    /// Returns true if the job finished successfully.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.job_state.is_some_and(|s| s.is_done())
    }

    fn display_id(&self) -> String {
        let len = self.job_id.chars().count();
        if len >= MASK_THRESHOLD {
            let tail: String = self.job_id.chars().skip(len - MASK_VISIBLE).collect();
            format!("{}{tail}", "*".repeat(len - MASK_VISIBLE))
        } else {
            self.job_id.clone()
        }
    }
}

impl std::fmt::Display for JobResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const NOT_SET: &str = "<NotSet>";
        writeln!(f, "JobResponse")?;
        writeln!(f, "  job_id: {}", self.display_id())?;
        writeln!(f, "  job_link: {}", self.job_link.as_deref().unwrap_or(NOT_SET))?;
        match self.job_state {
            Some(state) => writeln!(f, "  job_state: {state}")?,
            None => writeln!(f, "  job_state: {NOT_SET}")?,
        }
        if let Some(link) = &self.download_link {
            writeln!(f, "  download_link: {link}")?;
        }
        match &self.data {
            Some(table) => writeln!(f, "  data: {table}")?,
            None => writeln!(f, "  data: {NOT_SET}")?,
        }
        if let Some(counts) = self.counts {
            writeln!(f, "  counts: {counts}")?;
        }
        if let Some(files) = &self.files {
            writeln!(f, "  files: [{}]", files.len())?;
        }
        match &self.errors {
            Some(errors) => {
                writeln!(f, "  errors: [{}]", errors.len())?;
                for err in errors {
                    writeln!(f, "    {err}")?;
                }
                Ok(())
            }
            None => writeln!(f, "  errors: <NoErrors>"),
        }
    }
}
