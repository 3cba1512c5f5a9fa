//! Per-document lifecycle.

use std::fmt;
use std::path::Path;

use uuid::Uuid;

use paperforge_core::PaperError;
use paperforge_logging::{DocumentEvent, EventLogger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Detected,
    Staged,
    TextExtracted,
    Analyzed,
    Rebuilt,
    Filed,
    Errored,
}

impl DocumentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentState::Detected => "detected",
            DocumentState::Staged => "staged",
            DocumentState::TextExtracted => "text_extracted",
            DocumentState::Analyzed => "analyzed",
            DocumentState::Rebuilt => "rebuilt",
            DocumentState::Filed => "filed",
            DocumentState::Errored => "errored",
        }
    }

    /// Strict forward sequence; `Errored` only once the file is staged.
    pub fn can_advance_to(&self, next: DocumentState) -> bool {
        use DocumentState::*;
        matches!(
            (self, next),
            (Detected, Staged)
                | (Staged, TextExtracted)
                | (TextExtracted, Analyzed)
                | (Analyzed, Rebuilt)
                | (Rebuilt, Filed)
                | (Staged | TextExtracted | Analyzed | Rebuilt, Errored)
        )
    }

    /// The stage that runs while the document sits in this state.
    pub fn pending_stage(&self) -> &'static str {
        match self {
            DocumentState::Detected => "stage",
            DocumentState::Staged => "extract",
            DocumentState::TextExtracted => "analyze",
            DocumentState::Analyzed => "rebuild",
            DocumentState::Rebuilt => "file",
            DocumentState::Filed | DocumentState::Errored => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentState::Filed | DocumentState::Errored)
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn state_for(event: &DocumentEvent) -> DocumentState {
    match event {
        DocumentEvent::Detected { .. } => DocumentState::Detected,
        DocumentEvent::Staged { .. } => DocumentState::Staged,
        DocumentEvent::TextExtracted { .. } => DocumentState::TextExtracted,
        DocumentEvent::Analyzed { .. } => DocumentState::Analyzed,
        DocumentEvent::Rebuilt => DocumentState::Rebuilt,
        DocumentEvent::Filed { .. } => DocumentState::Filed,
        DocumentEvent::Errored { .. } => DocumentState::Errored,
    }
}

/// One in-flight document, identified by its original file name. Not persisted.
#[derive(Debug)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub file_name: String,
    state: DocumentState,
}

impl DocumentRecord {
    /// Start tracking a detected file and emit its `detected` event.
    pub fn detected(file_name: impl Into<String>, inbox_path: &Path) -> Self {
        let record = Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            state: DocumentState::Detected,
        };
        EventLogger::log_event(
            record.id,
            &record.file_name,
            DocumentEvent::Detected {
                inbox_path: inbox_path.display().to_string(),
            },
        );
        record
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// Apply a transition and log it. Out-of-order transitions are rejected.
    pub fn advance(&mut self, event: DocumentEvent) -> Result<(), PaperError> {
        let next = state_for(&event);
        if !self.state.can_advance_to(next) {
            return Err(PaperError::Other(anyhow::anyhow!(
                "invalid transition for {}: {} -> {}",
                self.file_name,
                self.state,
                next
            )));
        }
        self.state = next;
        EventLogger::log_event(self.id, &self.file_name, event);
        Ok(())
    }
}
