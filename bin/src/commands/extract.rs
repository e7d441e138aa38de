//! Extract command: snapshot extraction and result file download.

use super::{QueryOptions, base_query, ensure_done, load_settings, runner};
use anyhow::Result;
use factiva_lib::prelude::*;
use std::path::Path;
use tracing::info;

/// Build the extraction query from the CLI arguments.
pub(crate) fn build_query(
    options: &QueryOptions,
    limit: Option<i64>,
    file_format: &str,
    settings: &Settings,
) -> Result<ExtractionQuery> {
    let mut query = ExtractionQuery::from_base(base_query(options, settings, Endpoint::Extraction)?);
    if let Some(limit) = limit {
        query.set_limit(limit)?;
    }
    query.set_format(file_format)?;
    Ok(query)
}

/// Run an extraction job and download its files into `output_dir`.
pub(crate) async fn extract(
    options: &QueryOptions,
    limit: Option<i64>,
    file_format: &str,
    output_dir: &Path,
) -> Result<()> {
    let settings = load_settings()?;
    let query = build_query(options, limit, file_format, &settings)?;
    info!(%query, "Submitting extraction job");

    let mut runner = runner(query, &settings)?;
    ensure_done(runner.process().await?)?;

    let paths = runner.download_files(output_dir).await?;
    for path in &paths {
        println!("{}", path.display());
    }
    eprintln!("Downloaded {} files to {}", paths.len(), output_dir.display());
    Ok(())
}
