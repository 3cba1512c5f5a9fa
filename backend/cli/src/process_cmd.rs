use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};

use paperforge_pipeline::{handle_arrival, DispatchSummary, Pipeline, ReadinessCheck};

/// One-shot processing of explicit paths, in the order given.
pub async fn run(pipeline: &Pipeline, files: &[PathBuf]) -> Result<()> {
    let readiness = ReadinessCheck::new(Duration::ZERO);
    let mut summary = DispatchSummary::default();

    for file in files {
        handle_arrival(pipeline, &readiness, file, &mut summary).await;
    }

    println!(
        "filed: {}, quarantined: {}, missing: {}, staging errors: {}",
        summary.filed, summary.quarantined, summary.skipped, summary.staging_errors
    );
    if summary.filed != files.len() {
        bail!("{} of {} documents were not filed", files.len() - summary.filed, files.len());
    }
    Ok(())
}
