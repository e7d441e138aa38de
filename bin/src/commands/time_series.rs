//! Time-series command.

use super::{QueryOptions, base_query, ensure_done, load_settings, runner};
use crate::display::{Format, write_output};
use anyhow::Result;
use factiva_lib::prelude::*;
use std::path::PathBuf;
use tracing::info;

/// Aggregation options of the time-series command.
pub(crate) struct TimeSeriesOptions {
    pub(crate) frequency: String,
    pub(crate) date_field: String,
    pub(crate) group_dimension: Option<String>,
    pub(crate) top: i64,
}

/// Build the time-series query from the CLI arguments.
pub(crate) fn build_query(
    options: &QueryOptions,
    aggregation: &TimeSeriesOptions,
    settings: &Settings,
) -> Result<TimeSeriesQuery> {
    let mut query = TimeSeriesQuery::from_base(base_query(options, settings, Endpoint::TimeSeries)?);
    query.set_frequency(&aggregation.frequency)?;
    query.set_date_field(&aggregation.date_field)?;
    if let Some(dimension) = &aggregation.group_dimension {
        query.set_group_dimension(dimension)?;
    }
    query.set_top(aggregation.top)?;
    Ok(query)
}

/// Run a time-series job and write its results.
pub(crate) async fn time_series(
    options: &QueryOptions,
    aggregation: &TimeSeriesOptions,
    output: Option<PathBuf>,
    format: Format,
) -> Result<()> {
    let settings = load_settings()?;
    let query = build_query(options, aggregation, &settings)?;
    info!(%query, "Submitting time-series job");

    let mut runner = runner(query, &settings)?;
    let job = runner.process().await?;
    ensure_done(job)?;

    let Some(table) = &job.data else {
        anyhow::bail!("Job {} finished without results", job.job_id);
    };
    write_output(table, output.as_deref(), format)?;
    Ok(())
}
