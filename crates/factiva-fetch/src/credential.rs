//! Request credentials.

use std::collections::BTreeMap;

use factiva_types::{FactivaError, Settings, USER_KEY_ENV};
use serde_json::{Map, Value};

/// Length of a valid account user key.
pub const USER_KEY_LEN: usize = 32;

/// An authenticated identity that produces request headers.
pub trait Credential: std::fmt::Debug + Send + Sync {
    /// Returns the headers attached to every API request.
    fn headers(&self) -> BTreeMap<String, String>;
}

/// Account user key credential.
#[derive(Clone, PartialEq)]
pub struct UserKey {
    key: String,
    cloud_token: Map<String, Value>,
}

impl UserKey {
    /// Creates a credential from a 32-character key.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the key has the wrong length.
    pub fn new(key: impl Into<String>) -> Result<Self, FactivaError> {
        let key = key.into();
        if key.chars().count() != USER_KEY_LEN {
            return Err(FactivaError::invalid_field(
                "user_key",
                "Factiva User-Key has the wrong length",
            ));
        }
        Ok(Self {
            key,
            cloud_token: Map::new(),
        })
    }

    /// Creates a credential from the configured key.
    ///
    /// # Errors
    ///
    /// Returns an unauthorized error if no key is configured, or a validation
    /// error if the key has the wrong length.
    pub fn from_settings(settings: &Settings) -> Result<Self, FactivaError> {
        let key = settings.user_key.as_deref().ok_or_else(|| {
            FactivaError::Unauthorized(format!("no user key provided and {USER_KEY_ENV} is not set"))
        })?;
        Self::new(key)
    }

    /// Attaches the cloud token returned for streaming subscriptions.
    #[must_use]
    pub fn with_cloud_token(mut self, cloud_token: Map<String, Value>) -> Self {
        self.cloud_token = cloud_token;
        self
    }

    /// Returns the key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the cloud token. Empty unless one was attached.
    #[must_use]
    pub const fn cloud_token(&self) -> &Map<String, Value> {
        &self.cloud_token
    }

    fn masked(&self) -> String {
        let tail: String = self.key.chars().skip(USER_KEY_LEN - 4).collect();
        format!("{}{tail}", "*".repeat(USER_KEY_LEN - 4))
    }
}

impl Credential for UserKey {
    fn headers(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("user-key".to_string(), self.key.clone()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ])
    }
}

impl std::fmt::Debug for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserKey")
            .field("key", &self.masked())
            .field("cloud_token", &format_args!("{} entries", self.cloud_token.len()))
            .finish()
    }
}

impl std::fmt::Display for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserKey({})", self.masked())
    }
}
