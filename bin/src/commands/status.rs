//! Status command for jobs submitted earlier.

use super::{load_settings, transport};
use anyhow::{Context, Result};
use factiva_lib::prelude::*;

/// Poll an existing job once, or until it finishes with `wait`.
pub(crate) async fn status(endpoint: &str, job_id: &str, wait: bool) -> Result<()> {
    let endpoint: Endpoint = endpoint.parse()?;
    let settings = load_settings()?;

    let mut runner = JobRunner::builder(endpoint)
        .settings(&settings)
        .job_id(job_id)
        .build(transport()?)
        .with_context(|| format!("Cannot track job {job_id}"))?;

    let job = if wait {
        runner.wait().await?
    } else {
        runner.poll().await?
    };
    println!("{job}");
    Ok(())
}
