//! Field vocabularies and aggregation options.
//!
//! The constant lists are the column names the snapshot schema exposes for
//! filtering, grouping, and file decoding.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::FactivaError;

/// Fields allowed as `group_dimension` in time-series queries.
pub const GROUP_DIMENSION_FIELDS: &[&str] = &[
    "source_code",
    "subject_codes",
    "region_codes",
    "industry_codes",
    "company_codes",
    "person_codes",
    "company_codes_about",
    "company_codes_relevance",
    "company_codes_cusip",
    "company_codes_isin",
    "company_codes_sedol",
    "company_codes_ticker",
    "company_codes_about_cusip",
    "company_codes_about_isin",
    "company_codes_about_sedol",
    "company_codes_about_ticker",
    "company_codes_relevance_cusip",
    "company_codes_relevance_isin",
    "company_codes_relevance_sedol",
    "company_codes_relevance_ticker",
];

/// Fields allowed as keys in `includes`/`excludes` and their list variants.
pub const FILTER_FIELDS: &[&str] = &[
    "an",
    "source_code",
    "subject_codes",
    "region_codes",
    "region_of_origin",
    "industry_codes",
    "company_codes",
    "company_codes_about",
    "company_codes_occur",
    "company_codes_relevance",
    "company_codes_cusip",
    "company_codes_isin",
    "company_codes_sedol",
    "company_codes_ticker",
    "company_codes_about_cusip",
    "company_codes_about_isin",
    "company_codes_about_sedol",
    "company_codes_about_ticker",
    "company_codes_relevance_cusip",
    "company_codes_relevance_isin",
    "company_codes_relevance_sedol",
    "company_codes_relevance_ticker",
    "person_codes",
    "language_code",
];

/// Metadata-only columns kept when a snapshot file is read with `stats_only`.
pub const SNAPSHOT_FILE_STATS_FIELDS: &[&str] = &[
    "an",
    "company_codes",
    "company_codes_about",
    "company_codes_occur",
    "industry_codes",
    "ingestion_datetime",
    "language_code",
    "modification_datetime",
    "publication_datetime",
    "publisher_name",
    "region_codes",
    "region_of_origin",
    "source_code",
    "source_name",
    "subject_codes",
    "title",
    "word_count",
];

/// Deprecated columns dropped from decoded snapshot files.
pub const SNAPSHOT_FILE_DELETE_FIELDS: &[&str] =
    &["art", "credit", "document_type", "publication_date"];

/// Columns coerced to millisecond timestamps when decoding snapshot files.
pub const TIMESTAMP_FIELDS: &[&str] = &[
    "publication_datetime",
    "modification_datetime",
    "ingestion_datetime",
    "availability_datetime",
];

/// Time unit used to aggregate time-series values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    /// Daily buckets.
    Day,
    /// Monthly buckets.
    #[default]
    Month,
    /// Yearly buckets.
    Year,
}

impl Frequency {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "DAY",
            Self::Month => "MONTH",
            Self::Year => "YEAR",
        }
    }

    /// Returns all frequencies.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Day, Self::Month, Self::Year]
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = FactivaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DAY" => Ok(Self::Day),
            "MONTH" => Ok(Self::Month),
            "YEAR" => Ok(Self::Year),
            _ => Err(FactivaError::invalid_field(
                "frequency",
                format!("unexpected value '{s}', expected one of: DAY, MONTH, YEAR"),
            )),
        }
    }
}

/// Timestamp column used to bucket time-series values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    /// `publication_datetime`.
    #[default]
    PublicationDatetime,
    /// `modification_datetime`.
    ModificationDatetime,
    /// `ingestion_datetime`.
    IngestionDatetime,
}

impl DateField {
    /// Returns the column name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PublicationDatetime => "publication_datetime",
            Self::ModificationDatetime => "modification_datetime",
            Self::IngestionDatetime => "ingestion_datetime",
        }
    }
}

impl std::fmt::Display for DateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DateField {
    type Err = FactivaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "publication_datetime" => Ok(Self::PublicationDatetime),
            "modification_datetime" => Ok(Self::ModificationDatetime),
            "ingestion_datetime" => Ok(Self::IngestionDatetime),
            _ => Err(FactivaError::invalid_field(
                "date_field",
                format!(
                    "unexpected value '{s}', expected one of: publication_datetime, \
                     modification_datetime, ingestion_datetime"
                ),
            )),
        }
    }
}
