//! The payload contract a job runner submits.

use serde_json::Value;

use factiva_types::{Endpoint, Result, Settings};

use crate::{ExplainQuery, ExtractionQuery, SnapshotQuery, TimeSeriesQuery};

/// A query that can be submitted as a job.
pub trait JobQuery: std::fmt::Debug + std::fmt::Display + Send + Sync {
    /// Returns the endpoint this query is submitted to.
    fn endpoint(&self) -> Endpoint;

    /// Returns the request payload. Performs no I/O.
    fn build_payload(&self) -> Value;

    /// Returns the base query.
    fn base(&self) -> &SnapshotQuery;
}

impl JobQuery for ExplainQuery {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Explain
    }

    fn build_payload(&self) -> Value {
        self.base().payload()
    }

    fn base(&self) -> &SnapshotQuery {
        Self::base(self)
    }
}

impl JobQuery for TimeSeriesQuery {
    fn endpoint(&self) -> Endpoint {
        Endpoint::TimeSeries
    }

    fn build_payload(&self) -> Value {
        self.payload()
    }

    fn base(&self) -> &SnapshotQuery {
        Self::base(self)
    }
}

impl JobQuery for ExtractionQuery {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Extraction
    }

    fn build_payload(&self) -> Value {
        self.payload()
    }

    fn base(&self) -> &SnapshotQuery {
        Self::base(self)
    }
}

/// Builds the default query for `endpoint` from an optional `where` clause,
/// falling back to the configured one.
///
/// # Errors
///
/// Returns a validation error if no `where` clause is available.
pub fn default_query(
    endpoint: Endpoint,
    where_clause: Option<&str>,
    settings: &Settings,
) -> Result<Box<dyn JobQuery>> {
    let base = SnapshotQuery::resolve(where_clause, settings, endpoint)?;
    Ok(match endpoint {
        Endpoint::Explain => Box::new(ExplainQuery::from_base(base)),
        Endpoint::TimeSeries => Box::new(TimeSeriesQuery::from_base(base)),
        Endpoint::Extraction => Box::new(ExtractionQuery::from_base(base)),
    })
}
