//! Per-document pipeline: stage, extract, analyze, rebuild, file.
//!
//! Any failure after staging sends the working copy to the error folder
//! under its original name.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

use paperforge_config::AppConfig;
use paperforge_core::PaperError;
use paperforge_logging::DocumentEvent;
use paperforge_sandbox::{sidecar_path, PdfRebuilder};
use paperforge_understanding::{normalize, DocumentAnalyzer, TextSelector};

use crate::filename::{apply_document_date, base_filename, resolve_destination};
use crate::fs_ops::move_file;
use crate::state::DocumentRecord;

/// Terminal result for one document.
#[derive(Debug)]
pub enum Outcome {
    Filed {
        destination: PathBuf,
        timestamp_applied: bool,
    },
    Quarantined {
        /// `None` when the working file was already gone or could not be moved.
        destination: Option<PathBuf>,
        error: PaperError,
    },
}

impl Outcome {
    pub fn is_filed(&self) -> bool {
        matches!(self, Outcome::Filed { .. })
    }
}

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct Pipeline {
    config: Arc<AppConfig>,
    selector: TextSelector,
    analyzer: DocumentAnalyzer,
    rebuilder: PdfRebuilder,
    today: Clock,
}

impl Pipeline {
    pub fn new(
        config: Arc<AppConfig>,
        selector: TextSelector,
        analyzer: DocumentAnalyzer,
        rebuilder: PdfRebuilder,
    ) -> Self {
        Self {
            config,
            selector,
            analyzer,
            rebuilder,
            today: Box::new(|| Local::now().date_naive()),
        }
    }

    /// Replace the clock used when a document has no date.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run one inbox file to a terminal state.
    ///
    /// `Err` only when staging fails; the file is then left wherever it was.
    pub async fn process(&self, inbox_path: &Path) -> Result<Outcome, PaperError> {
        let file_name = inbox_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("not a file path: {}", inbox_path.display()))?;

        info!(file = %file_name, "Found new file");
        let mut record = DocumentRecord::detected(file_name.clone(), inbox_path);

        let working_path = self.config.folders.working.join(&file_name);
        move_file(inbox_path, &working_path)
            .await
            .map_err(|source| PaperError::Staging {
                file: file_name.clone(),
                source,
            })?;
        info!(file = %file_name, working_dir = %self.config.folders.working.display(), "Moved to working directory");
        record.advance(DocumentEvent::Staged {
            working_path: working_path.display().to_string(),
        })?;

        match self.run_stages(&mut record, &working_path).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => Ok(self.quarantine(&mut record, &working_path, err).await),
        }
    }

    async fn run_stages(
        &self,
        record: &mut DocumentRecord,
        working_path: &Path,
    ) -> Result<Outcome, PaperError> {
        let extracted = self.selector.extract(working_path).await?;
        record.advance(DocumentEvent::TextExtracted {
            source: extracted.source.as_str().to_string(),
            chars: extracted.text.chars().count(),
        })?;

        let analysis = self.analyzer.analyze(&extracted.text).await?;
        record.advance(DocumentEvent::Analyzed {
            sender: analysis.sender.clone(),
            doc_date: analysis.doc_date.clone(),
        })?;

        let metadata = normalize(&analysis);
        self.rebuilder
            .rebuild(working_path, &extracted.text, &metadata)
            .await?;
        record.advance(DocumentEvent::Rebuilt)?;

        let (base, dated) = base_filename(&analysis, self.config.language, (self.today)());
        if !dated {
            warn!(file = %record.file_name, "No date found in document, using current date for filename");
        }
        let destination = resolve_destination(&self.config.folders.processed, &base).await?;
        info!(destination = %destination.display(), "Moving file to processed folder");
        move_file(working_path, &destination).await?;

        let timestamp_applied = dated && apply_document_date(&destination, analysis.doc_date.as_deref()).await;
        record.advance(DocumentEvent::Filed {
            destination: destination.display().to_string(),
            timestamp_applied,
        })?;
        info!(file = %record.file_name, destination = %destination.display(), "Successfully processed");

        Ok(Outcome::Filed {
            destination,
            timestamp_applied,
        })
    }

    async fn quarantine(
        &self,
        record: &mut DocumentRecord,
        working_path: &Path,
        err: PaperError,
    ) -> Outcome {
        let stage = record.state().pending_stage();
        log_failure(&record.file_name, stage, &err);

        let error_dir = &self.config.folders.error;
        let destination = if tokio::fs::try_exists(working_path).await.unwrap_or(false) {
            let target = error_dir.join(&record.file_name);
            info!(destination = %target.display(), "Moving failed file to error folder");
            match move_file(working_path, &target).await {
                Ok(()) => Some(target),
                Err(e) => {
                    error!(file = %record.file_name, error = %e, "Failed to quarantine file");
                    None
                }
            }
        } else {
            warn!(file = %record.file_name, "Working file no longer exists; nothing to quarantine");
            None
        };

        if let Some(sidecar) = sidecar_path(working_path) {
            if tokio::fs::try_exists(&sidecar).await.unwrap_or(false) {
                if let Some(name) = sidecar.file_name() {
                    let target = error_dir.join(name);
                    if let Err(e) = move_file(&sidecar, &target).await {
                        warn!(sidecar = %sidecar.display(), error = %e, "Failed to quarantine sidecar");
                    }
                }
            }
        }

        let event = DocumentEvent::Errored {
            stage: stage.to_string(),
            kind: err.kind().to_string(),
            message: err.to_string(),
            quarantined_to: destination.as_ref().map(|p| p.display().to_string()),
        };
        if let Err(e) = record.advance(event) {
            warn!(error = %e, "Could not record failure transition");
        }

        Outcome::Quarantined {
            destination,
            error: err,
        }
    }
}

/// Error log line with whatever diagnostics the error carries.
fn log_failure(file_name: &str, stage: &str, err: &PaperError) {
    match err {
        PaperError::Rebuild {
            exit_code,
            stdout,
            stderr,
        } => error!(
            file = %file_name,
            stage = %stage,
            exit_code = ?exit_code,
            stdout = %stdout.trim(),
            stderr = %stderr.trim(),
            "Failed to process document"
        ),
        PaperError::MalformedAnalysis { reason, raw } => error!(
            file = %file_name,
            stage = %stage,
            reason = %reason,
            raw = %raw,
            "Failed to process document"
        ),
        other => error!(
            file = %file_name,
            stage = %stage,
            kind = other.kind(),
            error = %other,
            "Failed to process document"
        ),
    }
}
