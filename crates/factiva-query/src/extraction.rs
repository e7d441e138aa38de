//! Snapshot extraction query.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::str::FromStr;

use factiva_types::{Endpoint, FactivaError, Result};

use crate::base::{SnapshotQuery, wrap};

/// File format the server writes extraction results in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionFormat {
    /// Avro row-table files.
    #[default]
    Avro,
    /// JSON files.
    Json,
    /// CSV files.
    Csv,
}

impl ExtractionFormat {
    /// Returns the wire value, which is also the file extension.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Avro => "avro",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::fmt::Display for ExtractionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExtractionFormat {
    type Err = FactivaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "avro" => Ok(Self::Avro),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(FactivaError::invalid_field(
                "format",
                format!("unexpected value '{s}', expected one of: avro, json, csv"),
            )),
        }
    }
}

/// Query for the snapshot extraction endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionQuery {
    base: SnapshotQuery,
    limit: Option<u64>,
    format: ExtractionFormat,
}

impl ExtractionQuery {
    /// Creates an unlimited Avro extraction query.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `where_clause` is empty.
    pub fn new(where_clause: impl Into<String>) -> Result<Self> {
        SnapshotQuery::for_endpoint(where_clause, Endpoint::Extraction).map(Self::from_base)
    }

    /// Wraps an existing base query.
    #[must_use]
    pub const fn from_base(base: SnapshotQuery) -> Self {
        Self {
            base,
            limit: None,
            format: ExtractionFormat::Avro,
        }
    }

    /// Returns the base query.
    #[must_use]
    pub const fn base(&self) -> &SnapshotQuery {
        &self.base
    }

    /// Returns the base query for filter edits.
    pub const fn base_mut(&mut self) -> &mut SnapshotQuery {
        &mut self.base
    }

    /// Returns the document limit, if any.
    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Returns the output file format.
    #[must_use]
    pub const fn format(&self) -> ExtractionFormat {
        self.format
    }

    /// Limits the extraction to `limit` documents.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `limit` is negative.
    pub fn set_limit(&mut self, limit: i64) -> Result<()> {
        let limit = u64::try_from(limit)
            .map_err(|_| FactivaError::invalid_field("limit", "must be zero or greater"))?;
        self.limit = Some(limit);
        Ok(())
    }

    /// Sets the output file format from a case-insensitive name.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless the value is `avro`, `json` or `csv`.
    pub fn set_format(&mut self, value: &str) -> Result<()> {
        self.format = value.parse()?;
        Ok(())
    }

    /// Sets the output file format.
    #[must_use]
    pub const fn with_format(mut self, format: ExtractionFormat) -> Self {
        self.format = format;
        self
    }

    pub(crate) fn payload(&self) -> Value {
        let mut query = self.base.query_object();
        if let Some(limit) = self.limit {
            query.insert("limit".into(), json!(limit));
        }
        query.insert("format".into(), json!(self.format.as_str()));
        wrap(query)
    }
}

impl std::fmt::Display for ExtractionQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ExtractionQuery")?;
        self.base.fmt_fields(f)?;
        match self.limit {
            Some(limit) => writeln!(f, "  limit: {limit}")?,
            None => writeln!(f, "  limit: <NotSet>")?,
        }
        writeln!(f, "  format: {}", self.format)
    }
}
