//! Inbox arrivals as a stream of paths.
//!
//! A notify watcher (native or polling) feeds an unbounded channel; the
//! dispatch loop pulls one path at a time. Readiness is decided separately
//! by [`ReadinessCheck`] once the loop is ready to take the file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, error, info, warn};

/// Non-hidden file with a `.pdf` extension, any case.
pub fn is_pdf_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// The arrived path for a create or rename-into event, if it is a PDF.
pub fn arrival_path(event: &Event) -> Option<PathBuf> {
    let path = match event.kind {
        EventKind::Create(CreateKind::File | CreateKind::Any) => event.paths.first(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths.first(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event.paths.last(),
        _ => None,
    }?;
    is_pdf_candidate(path).then(|| path.clone())
}

pub struct InboxWatcher {
    _watcher: Box<dyn Watcher + Send>,
    arrivals: UnboundedReceiverStream<PathBuf>,
}

impl InboxWatcher {
    /// Watch `inbox` non-recursively. `poll_interval` selects the polling
    /// backend, for network mounts where native events are not delivered.
    pub fn start(inbox: &Path, poll_interval: Option<Duration>) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Some(path) = arrival_path(&event) {
                    debug!(path = %path.display(), kind = ?event.kind, "Inbox arrival");
                    if tx.send(path).is_err() {
                        debug!("Arrival receiver dropped");
                    }
                }
            }
            Err(e) => error!(error = %e, "Watch error"),
        };

        let mut watcher: Box<dyn Watcher + Send> = match poll_interval {
            Some(interval) => {
                let config = Config::default().with_poll_interval(interval);
                Box::new(PollWatcher::new(handler, config).context("Failed to create poll watcher")?)
            }
            None => Box::new(notify::recommended_watcher(handler).context("Failed to create watcher")?),
        };

        watcher
            .watch(inbox, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", inbox.display()))?;
        info!(
            folder = %inbox.display(),
            backend = if poll_interval.is_some() { "poll" } else { "native" },
            "Watching folder"
        );

        Ok(Self {
            _watcher: watcher,
            arrivals: UnboundedReceiverStream::new(rx),
        })
    }
}

impl Stream for InboxWatcher {
    type Item = PathBuf;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<PathBuf>> {
        Pin::new(&mut self.arrivals).poll_next(cx)
    }
}

/// PDFs already sitting in the inbox, sorted by file name.
pub async fn sweep_inbox(inbox: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(inbox)
        .await
        .with_context(|| format!("Failed to read {}", inbox.display()))?;
    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_pdf_candidate(&path) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Vanished,
}

/// Settle delay followed by a size-stability check.
#[derive(Debug, Clone)]
pub struct ReadinessCheck {
    settle: Duration,
    poll: Duration,
    max_polls: u32,
}

impl ReadinessCheck {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            poll: Duration::from_millis(500),
            max_polls: 20,
        }
    }

    pub fn with_polling(mut self, poll: Duration, max_polls: u32) -> Self {
        self.poll = poll;
        self.max_polls = max_polls.max(2);
        self
    }

    /// Wait until two consecutive size readings agree. A file that never
    /// settles is processed anyway after `max_polls` readings.
    pub async fn wait(&self, path: &Path) -> Readiness {
        tokio::time::sleep(self.settle).await;

        let mut last_size = None;
        for _ in 0..self.max_polls {
            match tokio::fs::metadata(path).await {
                Ok(meta) => {
                    let size = meta.len();
                    if last_size == Some(size) {
                        return Readiness::Ready;
                    }
                    last_size = Some(size);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => return Readiness::Vanished,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Could not stat file; processing anyway");
                    return Readiness::Ready;
                }
            }
            tokio::time::sleep(self.poll).await;
        }

        warn!(file = %path.display(), "File size still changing; processing anyway");
        Readiness::Ready
    }
}
