//! Explain query.

use factiva_types::{Endpoint, Result};

use crate::base::SnapshotQuery;

/// Query for the explain endpoint, which estimates the matching document volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainQuery {
    base: SnapshotQuery,
}

impl ExplainQuery {
    /// Creates an explain query.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `where_clause` is empty.
    pub fn new(where_clause: impl Into<String>) -> Result<Self> {
        SnapshotQuery::for_endpoint(where_clause, Endpoint::Explain).map(Self::from_base)
    }

    /// Wraps an existing base query.
    #[must_use]
    pub const fn from_base(base: SnapshotQuery) -> Self {
        Self { base }
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
}

impl std::fmt::Display for ExplainQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ExplainQuery")?;
        self.base.fmt_fields(f)
    }
}
