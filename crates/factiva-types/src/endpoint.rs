//! Job endpoint kinds and their validation rules.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::FactivaError;
use crate::fields::FILTER_FIELDS;

/// Rule constraining the format of a job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobIdRule {
    /// Canonical hyphenated UUID: 36 characters, 4 hyphens, hex digits.
    Uuid,
    /// Opaque path-like identifier: non-empty, no whitespace or control characters.
    Opaque,
}

impl JobIdRule {
    /// Validates a job identifier.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming `job_id` if the identifier does not match.
    pub fn check(&self, job_id: &str) -> Result<(), FactivaError> {
        match self {
            Self::Uuid => {
                if job_id.len() != 36 || job_id.matches('-').count() != 4 {
                    return Err(FactivaError::invalid_field(
                        "job_id",
                        "must be in UUID format (e.g., abcd1234-ab12-ab12-ab12-abcdef123456)",
                    ));
                }
                Uuid::try_parse(&job_id.to_lowercase())
                    .map(|_| ())
                    .map_err(|_| FactivaError::invalid_field("job_id", "must be a valid UUID"))
            }
            Self::Opaque => {
                if job_id.is_empty() {
                    return Err(FactivaError::invalid_field("job_id", "cannot be empty"));
                }
                if job_id.chars().any(|c| c.is_whitespace() || c.is_control()) {
                    return Err(FactivaError::invalid_field(
                        "job_id",
                        "cannot contain whitespace",
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Rule constraining the keys of a field filter to a fixed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    allowed: &'static [&'static str],
}

impl FieldRule {
    /// Accepts only the listed column names.
    #[must_use]
    pub const fn one_of(allowed: &'static [&'static str]) -> Self {
        Self { allowed }
    }

    /// Returns the accepted column names.
    #[must_use]
    pub const fn allowed(&self) -> &'static [&'static str] {
        self.allowed
    }

    /// Validates `value` assigned to the filter named `field`.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the filter and the rejected key.
    pub fn check(&self, field: &str, value: &str) -> Result<(), FactivaError> {
        if self.allowed.contains(&value) {
            Ok(())
        } else {
            Err(FactivaError::invalid_field(
                field,
                format!("'{value}' is not an allowed field"),
            ))
        }
    }
}

/// A server endpoint that runs asynchronous jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// Document volume estimate for a query.
    Explain,
    /// Time-series aggregation.
    TimeSeries,
    /// Snapshot extraction to files.
    Extraction,
}

impl Endpoint {
    /// Returns the API path jobs are submitted to.
    ///
    /// Status requests go to `{path}/{job_id}`.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Explain => "/extractions/documents/_explain",
            Self::TimeSeries => "/analytics",
            Self::Extraction => "/extractions/documents",
        }
    }

    /// Returns the job identifier rule for this endpoint.
    #[must_use]
    pub const fn job_id_rule(&self) -> JobIdRule {
        match self {
            Self::TimeSeries => JobIdRule::Uuid,
            Self::Explain | Self::Extraction => JobIdRule::Opaque,
        }
    }

    /// Returns the rule applied to include/exclude filter keys.
    #[must_use]
    pub const fn filter_rule(&self) -> FieldRule {
        FieldRule::one_of(FILTER_FIELDS)
    }

    /// Returns the endpoint identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Explain => "explain",
            Self::TimeSeries => "time_series",
            Self::Extraction => "extraction",
        }
    }

    /// Returns all endpoints.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Explain, Self::TimeSeries, Self::Extraction]
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = FactivaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "explain" => Ok(Self::Explain),
            "time_series" | "timeseries" | "analytics" => Ok(Self::TimeSeries),
            "extraction" | "extract" => Ok(Self::Extraction),
            _ => Err(FactivaError::invalid_field(
                "endpoint",
                format!("unknown endpoint '{s}', expected one of: explain, time_series, extraction"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_rule_accepts_canonical() {
        let rule = JobIdRule::Uuid;
        assert!(rule.check("abcd1234-ab12-ab12-ab12-abcdef123456").is_ok());
        assert!(rule.check("ABCD1234-AB12-AB12-AB12-ABCDEF123456").is_ok());
    }

    #[test]
    fn test_uuid_rule_rejects_malformed() {
        let rule = JobIdRule::Uuid;
        assert!(rule.check("abcd1234ab12ab12ab12abcdef123456").is_err());
        assert!(rule.check("abcd1234-ab12-ab12-ab12-abcdef12345").is_err());
        assert!(rule.check("zzzz1234-ab12-ab12-ab12-abcdef123456").is_err());
        assert!(rule.check("abcd1234-ab12-ab12-ab1-2abcdef123456").is_err());
    }

    #[test]
    fn test_opaque_rule() {
        let rule = JobIdRule::Opaque;
        assert!(rule.check("dj-synhub-extraction-abc123-xyz").is_ok());
        assert!(rule.check("explain/abc").is_ok());
        assert!(rule.check("").is_err());
        assert!(rule.check("has space").is_err());
    }

    #[test]
    fn test_field_rule() {
        let rule = FieldRule::one_of(&["source_code"]);
        assert!(rule.check("includes", "source_code").is_ok());
        let err = rule.check("includes", "headline").unwrap_err();
        assert!(err.to_string().contains("includes"));
        assert!(err.to_string().contains("headline"));
        assert!(rule.check("includes", " ").is_err());
    }

    #[test]
    fn test_endpoint_rules() {
        assert_eq!(Endpoint::TimeSeries.job_id_rule(), JobIdRule::Uuid);
        assert_eq!(Endpoint::Extraction.job_id_rule(), JobIdRule::Opaque);
        assert_eq!("time-series".parse::<Endpoint>().unwrap(), Endpoint::TimeSeries);
        assert!("streams".parse::<Endpoint>().is_err());
    }
}
