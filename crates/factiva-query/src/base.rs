//! The `where` clause and include/exclude filters shared by every query.

use std::collections::{BTreeMap, BTreeSet};

use factiva_types::fields::FILTER_FIELDS;
use factiva_types::{Endpoint, FactivaError, FieldRule, Result, Settings, WHERE_ENV};
use serde_json::{Map, Value, json};

/// Field name to value set, as sent in `includes`/`excludes` and their list variants.
pub type FieldFilter = BTreeMap<String, BTreeSet<String>>;

/// Longest `where` clause shown verbatim by `Display`.
const WHERE_DISPLAY_LEN: usize = 80;

/// Base snapshot query.
///
/// The `where` clause is always present and never empty. Filter keys are
/// checked against the field rule of the endpoint the query was built for, at
/// the moment they are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotQuery {
    where_clause: String,
    includes: FieldFilter,
    excludes: FieldFilter,
    include_lists: FieldFilter,
    exclude_lists: FieldFilter,
    rule: FieldRule,
}

impl SnapshotQuery {
    /// Creates a query with the default filter vocabulary.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `where_clause` is empty.
    pub fn new(where_clause: impl Into<String>) -> Result<Self> {
        Self::with_rule(where_clause, FieldRule::one_of(FILTER_FIELDS))
    }

    /// Creates a query whose filter keys follow `endpoint`'s field rule.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `where_clause` is empty.
    pub fn for_endpoint(where_clause: impl Into<String>, endpoint: Endpoint) -> Result<Self> {
        Self::with_rule(where_clause, endpoint.filter_rule())
    }

    fn with_rule(where_clause: impl Into<String>, rule: FieldRule) -> Result<Self> {
        let where_clause = where_clause.into();
        if where_clause.trim().is_empty() {
            return Err(FactivaError::invalid_field("where", "cannot be empty"));
        }
        Ok(Self {
            where_clause,
            includes: FieldFilter::new(),
            excludes: FieldFilter::new(),
            include_lists: FieldFilter::new(),
            exclude_lists: FieldFilter::new(),
            rule,
        })
    }

    /// Creates a query from an explicit `where` clause, falling back to the
    /// configured default when none (or an empty one) is given.
    ///
    /// # Errors
    ///
    /// Returns a validation error if neither source provides a clause.
    pub fn resolve(
        where_clause: Option<&str>,
        settings: &Settings,
        endpoint: Endpoint,
    ) -> Result<Self> {
        let clause = where_clause
            .filter(|w| !w.trim().is_empty())
            .or(settings.where_clause.as_deref())
            .ok_or_else(|| {
                FactivaError::invalid_field(
                    "where",
                    format!("value not provided and {WHERE_ENV} is not set"),
                )
            })?;
        Self::for_endpoint(clause, endpoint)
    }

    /// Returns the `where` clause.
    #[must_use]
    pub fn where_clause(&self) -> &str {
        &self.where_clause
    }

    /// Returns the inclusion filters.
    #[must_use]
    pub const fn includes(&self) -> &FieldFilter {
        &self.includes
    }

    /// Returns the exclusion filters.
    #[must_use]
    pub const fn excludes(&self) -> &FieldFilter {
        &self.excludes
    }

    /// Returns the list-reference inclusion filters.
    #[must_use]
    pub const fn include_lists(&self) -> &FieldFilter {
        &self.include_lists
    }

    /// Returns the list-reference exclusion filters.
    #[must_use]
    pub const fn exclude_lists(&self) -> &FieldFilter {
        &self.exclude_lists
    }

    /// Adds values to include for `field`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `field` is outside the allowed vocabulary.
    pub fn include<I, V>(&mut self, field: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        insert(&mut self.includes, self.rule, "includes", field, values)
    }

    /// Adds values to exclude for `field`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `field` is outside the allowed vocabulary.
    pub fn exclude<I, V>(&mut self, field: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        insert(&mut self.excludes, self.rule, "excludes", field, values)
    }

    /// Adds list ids whose codes are included for `field`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `field` is outside the allowed vocabulary.
    pub fn include_list<I, V>(&mut self, field: &str, list_ids: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        insert(&mut self.include_lists, self.rule, "includesList", field, list_ids)
    }

    /// Adds list ids whose codes are excluded for `field`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `field` is outside the allowed vocabulary.
    pub fn exclude_list<I, V>(&mut self, field: &str, list_ids: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        insert(&mut self.exclude_lists, self.rule, "excludesList", field, list_ids)
    }

    /// Returns the body of the `query` object: `where` plus every non-empty filter.
    #[must_use]
    pub fn query_object(&self) -> Map<String, Value> {
        let mut query = Map::new();
        query.insert("where".into(), Value::String(self.where_clause.clone()));
        for (key, filter) in [
            ("includes", &self.includes),
            ("excludes", &self.excludes),
            ("includesList", &self.include_lists),
            ("excludesList", &self.exclude_lists),
        ] {
            if !filter.is_empty() {
                query.insert(key.into(), json!(filter));
            }
        }
        query
    }

    /// Returns the request payload: `{"query": {...}}`.
    #[must_use]
    pub fn payload(&self) -> Value {
        wrap(self.query_object())
    }

    pub(crate) fn fmt_fields(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = if self.where_clause.chars().count() > WHERE_DISPLAY_LEN {
            let head: String = self.where_clause.chars().take(WHERE_DISPLAY_LEN - 3).collect();
            format!("{head}...")
        } else {
            self.where_clause.clone()
        };
        writeln!(f, "  where: {shown}")?;
        for (name, filter) in [
            ("includes", &self.includes),
            ("excludes", &self.excludes),
            ("include_lists", &self.include_lists),
            ("exclude_lists", &self.exclude_lists),
        ] {
            if filter.is_empty() {
                writeln!(f, "  {name}: <NotSet>")?;
            } else {
                writeln!(f, "  {name}: {} conditions", filter.len())?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for SnapshotQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SnapshotQuery")?;
        self.fmt_fields(f)
    }
}

pub(crate) fn wrap(query: Map<String, Value>) -> Value {
    let mut payload = Map::new();
    payload.insert("query".into(), Value::Object(query));
    Value::Object(payload)
}

fn insert<I, V>(
    filter: &mut FieldFilter,
    rule: FieldRule,
    name: &str,
    field: &str,
    values: I,
) -> Result<()>
where
    I: IntoIterator<Item = V>,
    V: Into<String>,
{
    rule.check(name, field)?;
    let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
    if !values.is_empty() {
        filter.entry(field.to_string()).or_default().extend(values);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_is_passed_through_unmodified() {
        let clause = "  publication_datetime >= '2023-01-01' AND LOWER(language_code)='en' ";
        let query = SnapshotQuery::new(clause).unwrap();
        assert_eq!(query.payload()["query"]["where"], clause);
    }

    #[test]
    fn test_empty_where_is_rejected() {
        assert!(matches!(
            SnapshotQuery::new("   "),
            Err(FactivaError::Validation(_))
        ));
    }

    #[test]
    fn test_resolve_falls_back_to_settings() {
        let settings = Settings {
            where_clause: Some("LA='en'".into()),
            ..Settings::default()
        };
        let query = SnapshotQuery::resolve(None, &settings, Endpoint::Explain).unwrap();
        assert_eq!(query.where_clause(), "LA='en'");

        let query = SnapshotQuery::resolve(Some("LA='de'"), &settings, Endpoint::Explain).unwrap();
        assert_eq!(query.where_clause(), "LA='de'");

        let err = SnapshotQuery::resolve(None, &Settings::default(), Endpoint::Explain).unwrap_err();
        assert!(err.to_string().contains(WHERE_ENV));
    }

    #[test]
    fn test_filters_are_added_to_payload() {
        let mut query = SnapshotQuery::new("LA='en'").unwrap();
        query.include("source_code", ["WSJO", "DJDN"]).unwrap();
        query.exclude("subject_codes", ["gsport"]).unwrap();
        query.include_list("industry_codes", ["list-1"]).unwrap();

        let payload = query.payload();
        assert_eq!(
            payload["query"]["includes"],
            json!({"source_code": ["DJDN", "WSJO"]})
        );
        assert_eq!(payload["query"]["excludes"], json!({"subject_codes": ["gsport"]}));
        assert_eq!(
            payload["query"]["includesList"],
            json!({"industry_codes": ["list-1"]})
        );
        assert!(payload["query"].get("excludesList").is_none());
    }

    #[test]
    fn test_unknown_filter_field_fails_immediately() {
        let mut query = SnapshotQuery::new("LA='en'").unwrap();
        let err = query.include("headline", ["x"]).unwrap_err();
        assert!(err.to_string().contains("includes"));
        assert!(err.to_string().contains("headline"));
        assert!(query.includes().is_empty());
    }

    #[test]
    fn test_display_truncates_long_where() {
        let clause = "x".repeat(120);
        let query = SnapshotQuery::new(clause).unwrap();
        let shown = query.to_string();
        assert!(shown.contains(&format!("{}...", "x".repeat(77))));
        assert!(shown.contains("includes: <NotSet>"));
    }
}
