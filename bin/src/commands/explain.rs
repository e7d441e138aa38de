//! Explain command: document count estimate for a query.

use super::{QueryOptions, base_query, ensure_done, load_settings, runner};
use anyhow::Result;
use factiva_lib::prelude::*;
use tracing::info;

/// Submit an explain job and print its document count.
pub(crate) async fn explain(options: &QueryOptions) -> Result<()> {
    let settings = load_settings()?;
    let query = ExplainQuery::from_base(base_query(options, &settings, Endpoint::Explain)?);
    info!(%query, "Submitting explain job");

    let mut runner = runner(query, &settings)?;
    let job = runner.process().await?;
    ensure_done(job)?;

    match job.counts {
        Some(counts) => println!("{counts}"),
        None => println!("{job}"),
    }
    Ok(())
}
