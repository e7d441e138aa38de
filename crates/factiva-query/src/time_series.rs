//! Time-series aggregation query.

use factiva_types::fields::GROUP_DIMENSION_FIELDS;
use factiva_types::{DateField, Endpoint, FactivaError, Frequency, Result};
use serde_json::{Value, json};
use tracing::warn;

use crate::base::{SnapshotQuery, wrap};

/// Default number of entries per group and period.
pub const DEFAULT_TOP: i64 = 10;

/// Query for the time-series (analytics) endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesQuery {
    base: SnapshotQuery,
    frequency: Frequency,
    date_field: DateField,
    group_dimension: Option<String>,
    top: i64,
}

impl TimeSeriesQuery {
    /// Creates a query with monthly buckets over `publication_datetime`, no
    /// group dimension and `top` 10.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `where_clause` is empty.
    pub fn new(where_clause: impl Into<String>) -> Result<Self> {
        SnapshotQuery::for_endpoint(where_clause, Endpoint::TimeSeries).map(Self::from_base)
    }

    /// Wraps an existing base query with the default aggregation options.
    #[must_use]
    pub fn from_base(base: SnapshotQuery) -> Self {
        Self {
            base,
            frequency: Frequency::default(),
            date_field: DateField::default(),
            group_dimension: None,
            top: DEFAULT_TOP,
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

    /// Returns the bucket frequency.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Returns the bucketing timestamp column.
    #[must_use]
    pub const fn date_field(&self) -> DateField {
        self.date_field
    }

    /// Returns the group dimension, if any.
    #[must_use]
    pub fn group_dimension(&self) -> Option<&str> {
        self.group_dimension.as_deref()
    }

    /// Returns the per-group entry limit. `-1` means all entries.
    #[must_use]
    pub const fn top(&self) -> i64 {
        self.top
    }

    /// Sets the frequency from a case-insensitive name.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless the value is `DAY`, `MONTH` or `YEAR`.
    pub fn set_frequency(&mut self, value: &str) -> Result<()> {
        self.frequency = value.parse()?;
        Ok(())
    }

    /// Sets the frequency.
    #[must_use]
    pub const fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Sets the bucketing column from a case-insensitive name.
    ///
    /// # Errors
    ///
    /// Returns a validation error for columns other than the three datetime fields.
    pub fn set_date_field(&mut self, value: &str) -> Result<()> {
        self.date_field = value.parse()?;
        Ok(())
    }

    /// Sets the bucketing column.
    #[must_use]
    pub const fn with_date_field(mut self, date_field: DateField) -> Self {
        self.date_field = date_field;
        self
    }

    /// Sets the group dimension.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `value` is not a groupable field.
    pub fn set_group_dimension(&mut self, value: &str) -> Result<()> {
        self.group_dimension = Some(check_dimension(value)?.to_string());
        Ok(())
    }

    /// Sets the group dimension from a list, keeping only its first element.
    ///
    /// The server aggregates over a single dimension; extra elements are
    /// discarded with a warning.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the list is empty or its first element is
    /// not a groupable field.
    pub fn set_group_dimensions(&mut self, values: &[&str]) -> Result<()> {
        let (first, rest) = values.split_first().ok_or_else(|| {
            FactivaError::invalid_field("group_dimension", "must be a name or a non-empty list")
        })?;
        self.set_group_dimension(first)?;
        if !rest.is_empty() {
            warn!(
                kept = *first,
                dropped = ?rest,
                "Only the first group dimension is used"
            );
        }
        Ok(())
    }

    /// Removes the group dimension.
    pub fn clear_group_dimension(&mut self) {
        self.group_dimension = None;
    }

    /// Sets the per-group entry limit.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `top` is below `-1`.
    pub fn set_top(&mut self, top: i64) -> Result<()> {
        if top < -1 {
            return Err(FactivaError::invalid_field(
                "top",
                "must be an integer greater than or equal to -1",
            ));
        }
        self.top = top;
        Ok(())
    }

    pub(crate) fn payload(&self) -> Value {
        let mut query = self.base.query_object();
        query.insert("frequency".into(), json!(self.frequency.as_str()));
        query.insert("date_field".into(), json!(self.date_field.as_str()));
        if let Some(dimension) = &self.group_dimension {
            query.insert("group_dimensions".into(), json!([dimension]));
        }
        query.insert("top".into(), json!(self.top));
        wrap(query)
    }
}

impl std::fmt::Display for TimeSeriesQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "TimeSeriesQuery")?;
        self.base.fmt_fields(f)?;
        writeln!(f, "  frequency: {}", self.frequency)?;
        writeln!(f, "  date_field: {}", self.date_field)?;
        writeln!(
            f,
            "  group_dimension: {}",
            self.group_dimension.as_deref().unwrap_or("<NotSet>")
        )?;
        writeln!(f, "  top: {}", self.top)
    }
}

fn check_dimension(value: &str) -> Result<&str> {
    if GROUP_DIMENSION_FIELDS.contains(&value) {
        Ok(value)
    } else {
        Err(FactivaError::invalid_field(
            "group_dimension",
            format!("'{value}' is not a valid group dimension"),
        ))
    }
}
