//! CLI command implementations.

use anyhow::{Context, Result, bail};
use factiva_lib::prelude::*;
use factiva_lib::SnapshotQuery;

pub(crate) mod explain;
pub(crate) mod extract;
pub(crate) mod read_avro;
pub(crate) mod status;
pub(crate) mod time_series;

/// Query arguments shared by the job-submitting commands.
pub(crate) struct QueryOptions {
    pub(crate) where_clause: Option<String>,
    pub(crate) include: Vec<String>,
    pub(crate) exclude: Vec<String>,
}

/// Splits a `FIELD=VALUE[,VALUE...]` filter argument.
pub(crate) fn parse_filter(arg: &str) -> Result<(&str, Vec<&str>)> {
    let Some((field, values)) = arg.split_once('=') else {
        bail!("Invalid filter '{arg}', expected FIELD=VALUE[,VALUE...]");
    };
    let values: Vec<&str> = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if field.trim().is_empty() || values.is_empty() {
        bail!("Invalid filter '{arg}', expected FIELD=VALUE[,VALUE...]");
    }
    Ok((field.trim(), values))
}

/// Builds the base query for `endpoint` from the CLI arguments and settings.
pub(crate) fn base_query(
    options: &QueryOptions,
    settings: &Settings,
    endpoint: Endpoint,
) -> Result<SnapshotQuery> {
    let mut base = SnapshotQuery::resolve(options.where_clause.as_deref(), settings, endpoint)?;
    for arg in &options.include {
        let (field, values) = parse_filter(arg)?;
        base.include(field, values)?;
    }
    for arg in &options.exclude {
        let (field, values) = parse_filter(arg)?;
        base.exclude(field, values)?;
    }
    Ok(base)
}

/// Loads settings from the environment.
pub(crate) fn load_settings() -> Result<Settings> {
    Settings::from_env().context("Failed to load settings from the environment")
}

/// Creates the production transport.
pub(crate) fn transport() -> Result<ReqwestTransport> {
    ReqwestTransport::with_defaults().context("Failed to create HTTP client")
}

/// Builds a runner for a prepared query.
pub(crate) fn runner(
    query: impl JobQuery + 'static,
    settings: &Settings,
) -> Result<JobRunner<ReqwestTransport>> {
    let runner = JobRunner::builder(query.endpoint())
        .settings(settings)
        .query(query)
        .build(transport()?)?;
    Ok(runner)
}

/// Fails unless the job finished successfully, listing the server's errors.
pub(crate) fn ensure_done(job: &JobResponse) -> Result<()> {
    if job.is_done() {
        return Ok(());
    }
    let errors = job
        .errors
        .iter()
        .flatten()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    bail!("Job {} failed: {errors}", job.job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        let (field, values) = parse_filter("source_code=WSJO, DJDN").unwrap();
        assert_eq!(field, "source_code");
        assert_eq!(values, vec!["WSJO", "DJDN"]);
    }

    #[test]
    fn test_parse_filter_rejects_malformed() {
        assert!(parse_filter("source_code").is_err());
        assert!(parse_filter("=WSJO").is_err());
        assert!(parse_filter("source_code=").is_err());
    }

    #[test]
    fn test_base_query_applies_filters() {
        let settings = Settings::default();
        let options = QueryOptions {
            where_clause: Some("LA='en'".into()),
            include: vec!["source_code=WSJO".into()],
            exclude: vec!["industry_codes=i1,i2".into()],
        };
        let base = base_query(&options, &settings, Endpoint::TimeSeries).unwrap();
        assert_eq!(base.where_clause(), "LA='en'");
        assert_eq!(base.includes()["source_code"].len(), 1);
        assert_eq!(base.excludes()["industry_codes"].len(), 2);
    }

    #[test]
    fn test_ensure_done_lists_errors() {
        let mut job = JobResponse::new("abc");
        job.job_state = Some(JobState::Failed);
        job.errors = Some(vec![factiva_lib::JobError {
            title: "Failure".into(),
            detail: "Query timed out".into(),
        }]);
        let err = ensure_done(&job).unwrap_err();
        assert!(err.to_string().contains("Query timed out"));
    }
}
