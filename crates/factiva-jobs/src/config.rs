//! Runner configuration.

use std::time::Duration;

use factiva_types::{DEFAULT_API_HOST, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, Settings};

/// Host and wait-loop bounds used by a [`JobRunner`](crate::JobRunner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// API host, without a trailing slash.
    pub api_host: String,
    /// Sleep between status polls while waiting.
    pub poll_interval: Duration,
    /// Maximum time spent waiting. `None` waits indefinitely.
    pub max_wait: Option<Duration>,
    /// Maximum status polls per wait. `None` is unbounded.
    pub max_polls: Option<u32>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: Some(DEFAULT_MAX_WAIT),
            max_polls: None,
        }
    }
}

impl RunnerConfig {
    /// Carries the host and wait bounds over from resolved settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_host: settings.api_host.clone(),
            poll_interval: settings.poll_interval,
            max_wait: settings.max_wait,
            max_polls: settings.max_polls,
        }
    }

    /// Sets the API host.
    #[must_use]
    pub fn with_api_host(mut self, api_host: impl Into<String>) -> Self {
        self.api_host = api_host.into();
        self
    }

    /// Sets the sleep between status polls.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the maximum wait time.
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Sets the maximum number of status polls.
    #[must_use]
    pub const fn with_max_polls(mut self, max_polls: Option<u32>) -> Self {
        self.max_polls = max_polls;
        self
    }
}
