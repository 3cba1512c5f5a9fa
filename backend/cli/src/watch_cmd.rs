use std::time::Duration;

use anyhow::Result;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use paperforge_pipeline::{run_dispatch_loop, sweep_inbox, InboxWatcher, Pipeline, ReadinessCheck};

pub async fn run(pipeline: &Pipeline, sweep: bool) -> Result<()> {
    let config = pipeline.config();
    info!(language = %config.language, "Starting document processor");

    let poll_interval = config.watch.poll_interval_ms.map(Duration::from_millis);
    let watcher = InboxWatcher::start(&config.folders.inbox, poll_interval)?;

    // Started after the watcher so nothing lands unseen in between.
    let backlog = if sweep || config.watch.sweep_on_start {
        let found = sweep_inbox(&config.folders.inbox).await?;
        info!(count = found.len(), "Queued PDFs already in the inbox");
        found
    } else {
        Vec::new()
    };

    let arrivals = tokio_stream::iter(backlog).chain(watcher);
    let readiness = ReadinessCheck::new(Duration::from_millis(config.watch.settle_delay_ms));

    info!("Running. Press Ctrl+C to stop.");
    let summary = run_dispatch_loop(pipeline, arrivals, &readiness, shutdown_signal()).await;
    info!(processed = summary.total(), "Stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
