//! Configuration snapshot resolved from the environment.

use std::time::Duration;

use crate::FactivaError;

/// Environment variable holding the account user key.
pub const USER_KEY_ENV: &str = "FACTIVA_USERKEY";

/// Environment variable holding the default query `where` clause.
pub const WHERE_ENV: &str = "FACTIVA_WHERE";

/// Environment variable overriding the API host.
pub const API_HOST_ENV: &str = "FACTIVA_API_HOST";

/// Environment variable setting the seconds between job status polls.
pub const POLL_INTERVAL_ENV: &str = "FACTIVA_POLL_INTERVAL_SECS";

/// Environment variable bounding the seconds spent waiting for a job. `0` disables the bound.
pub const MAX_WAIT_ENV: &str = "FACTIVA_MAX_WAIT_SECS";

/// Environment variable bounding the number of status polls per wait.
pub const MAX_POLLS_ENV: &str = "FACTIVA_MAX_POLLS";

/// Default API host.
pub const DEFAULT_API_HOST: &str = "https://api.dowjones.com";

/// Default spacing between job status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default bound on the time spent waiting for a job.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(3600);

/// Process-wide defaults, read once before any client object is built.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Account user key used when no credential is passed explicitly.
    pub user_key: Option<String>,
    /// `where` clause used when a query is built without one.
    pub where_clause: Option<String>,
    /// API host, without a trailing slash.
    pub api_host: String,
    /// Spacing between job status polls.
    pub poll_interval: Duration,
    /// Bound on the time spent waiting for a job.
    pub max_wait: Option<Duration>,
    /// Bound on the number of status polls per wait.
    pub max_polls: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_key: None,
            where_clause: None,
            api_host: DEFAULT_API_HOST.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: Some(DEFAULT_MAX_WAIT),
            max_polls: None,
        }
    }
}

impl Settings {
    /// Resolves settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self, FactivaError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings from an arbitrary key lookup. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FactivaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self {
            user_key: get(USER_KEY_ENV),
            where_clause: get(WHERE_ENV),
            ..Self::default()
        };

        if let Some(host) = get(API_HOST_ENV) {
            settings.api_host = host.trim_end_matches('/').to_string();
        }
        if let Some(secs) = get(POLL_INTERVAL_ENV) {
            settings.poll_interval = Duration::from_secs(parse_number(POLL_INTERVAL_ENV, &secs)?);
        }
        if let Some(secs) = get(MAX_WAIT_ENV) {
            settings.max_wait = match parse_number(MAX_WAIT_ENV, &secs)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            };
        }
        if let Some(polls) = get(MAX_POLLS_ENV) {
            let polls = u32::try_from(parse_number(MAX_POLLS_ENV, &polls)?)
                .map_err(|_| FactivaError::Config(format!("{MAX_POLLS_ENV} is out of range")))?;
            settings.max_polls = Some(polls);
        }

        Ok(settings)
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("user_key", &self.user_key.as_ref().map(|_| "<redacted>"))
            .field("where_clause", &self.where_clause)
            .field("api_host", &self.api_host)
            .field("poll_interval", &self.poll_interval)
            .field("max_wait", &self.max_wait)
            .field("max_polls", &self.max_polls)
            .finish()
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, FactivaError> {
    value
        .trim()
        .parse()
        .map_err(|_| FactivaError::Config(format!("{key} must be a whole number, got '{value}'")))
}
