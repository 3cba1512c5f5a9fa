//! Sequential dispatch: one arrival is processed to completion before the
//! next is pulled.

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio_stream::{Stream, StreamExt};
use tracing::{debug, error, info};

use crate::orchestrator::{Outcome, Pipeline};
use crate::watcher::{Readiness, ReadinessCheck};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub filed: usize,
    pub quarantined: usize,
    /// Arrivals that were gone before processing began.
    pub skipped: usize,
    pub staging_errors: usize,
}

impl DispatchSummary {
    pub fn total(&self) -> usize {
        self.filed + self.quarantined + self.skipped + self.staging_errors
    }
}

/// Wait for the file to settle, then run it through the pipeline.
pub async fn handle_arrival(
    pipeline: &Pipeline,
    readiness: &ReadinessCheck,
    path: &Path,
    summary: &mut DispatchSummary,
) {
    if readiness.wait(path).await == Readiness::Vanished {
        debug!(path = %path.display(), "Arrival no longer in inbox; skipping");
        summary.skipped += 1;
        return;
    }

    match pipeline.process(path).await {
        Ok(Outcome::Filed { .. }) => summary.filed += 1,
        Ok(Outcome::Quarantined { .. }) => summary.quarantined += 1,
        Err(e) => {
            error!(path = %path.display(), kind = e.kind(), error = %e, "Failed to stage file");
            summary.staging_errors += 1;
        }
    }
}

/// Drain `arrivals` until it ends or `shutdown` resolves. Shutdown is only
/// observed between documents; an in-flight document always completes.
pub async fn run_dispatch_loop<S, F>(
    pipeline: &Pipeline,
    mut arrivals: S,
    readiness: &ReadinessCheck,
    shutdown: F,
) -> DispatchSummary
where
    S: Stream<Item = PathBuf> + Unpin,
    F: Future<Output = ()>,
{
    let mut summary = DispatchSummary::default();
    tokio::pin!(shutdown);

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown requested; stopping dispatch");
                break;
            }
            next = arrivals.next() => next,
        };
        let Some(path) = next else {
            debug!("Arrival stream ended");
            break;
        };
        handle_arrival(pipeline, readiness, &path, &mut summary).await;
    }

    info!(
        filed = summary.filed,
        quarantined = summary.quarantined,
        skipped = summary.skipped,
        staging_errors = summary.staging_errors,
        "Dispatch loop finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use paperforge_understanding::mock::MockLlmProvider;

    use crate::test_support::{dir_names, drop_in_inbox, fixture, pipeline, ACME_RESPONSE};

    fn instant() -> ReadinessCheck {
        ReadinessCheck::new(Duration::ZERO).with_polling(Duration::from_millis(5), 3)
    }

    #[tokio::test]
    async fn arrivals_are_processed_in_order() {
        let fx = fixture("english").await;
        let llm = Arc::new(MockLlmProvider::new("mock").with_response(ACME_RESPONSE));
        let pipeline = pipeline(&fx, llm.clone(), 0);

        let first = drop_in_inbox(&fx, "a.pdf");
        let second = drop_in_inbox(&fx, "b.pdf");
        let gone = fx.config.folders.inbox.join("gone.pdf");
        let arrivals = tokio_stream::iter(vec![first, gone, second]);

        let summary =
            run_dispatch_loop(&pipeline, arrivals, &instant(), std::future::pending()).await;

        assert_eq!(summary, DispatchSummary { filed: 2, quarantined: 0, skipped: 1, staging_errors: 0 });
        assert_eq!(llm.calls(), 2);
        assert_eq!(
            dir_names(&fx.config.folders.processed),
            ["2024-03-01_Acme_Corp_Invoice-1.pdf", "2024-03-01_Acme_Corp_Invoice.pdf"]
        );
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_loop() {
        let fx = fixture("english").await;
        let llm = Arc::new(MockLlmProvider::new("mock").with_response("no json"));
        let pipeline = pipeline(&fx, llm, 0);

        let arrivals = tokio_stream::iter(vec![drop_in_inbox(&fx, "x.pdf"), drop_in_inbox(&fx, "y.pdf")]);
        let summary =
            run_dispatch_loop(&pipeline, arrivals, &instant(), std::future::pending()).await;

        assert_eq!(summary.quarantined, 2);
        assert_eq!(summary.total(), 2);
        assert_eq!(dir_names(&fx.config.folders.error), ["x.pdf", "y.pdf"]);
    }

    #[tokio::test]
    async fn shutdown_stops_before_next_arrival() {
        let fx = fixture("english").await;
        let llm = Arc::new(MockLlmProvider::new("mock").with_response(ACME_RESPONSE));
        let pipeline = pipeline(&fx, llm.clone(), 0);

        let arrivals = tokio_stream::iter(vec![drop_in_inbox(&fx, "a.pdf")]);
        let summary = run_dispatch_loop(&pipeline, arrivals, &instant(), async {}).await;

        assert_eq!(summary.total(), 0);
        assert_eq!(llm.calls(), 0);
        assert_eq!(dir_names(&fx.config.folders.inbox), ["a.pdf"]);
    }
}
