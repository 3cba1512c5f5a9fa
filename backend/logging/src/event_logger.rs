//! Document Event Logger
//!
//! One structured entry per document state transition, emitted on the
//! `document_events` target so file sinks can filter them out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentEvent {
    Detected {
        inbox_path: String,
    },
    Staged {
        working_path: String,
    },
    TextExtracted {
        source: String,
        chars: usize,
    },
    Analyzed {
        sender: Option<String>,
        doc_date: Option<String>,
    },
    Rebuilt,
    Filed {
        destination: String,
        timestamp_applied: bool,
    },
    Errored {
        stage: String,
        kind: String,
        message: String,
        quarantined_to: Option<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub document_id: Uuid,
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
    pub event: DocumentEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Serialize a lifecycle event into the tracing stream, redacting free text.
    pub fn log_event(document_id: Uuid, file_name: &str, mut event: DocumentEvent) {
        if let DocumentEvent::Errored { message, .. } = &mut event {
            *message = redact_sensitive_data(message);
        }

        let entry = EventLogEntry {
            document_id,
            file_name: file_name.to_string(),
            timestamp: Utc::now(),
            event,
        };

        let is_error = matches!(entry.event, DocumentEvent::Errored { .. });
        match serde_json::to_string(&entry) {
            Ok(json) if is_error => warn!(target: "document_events", event = %json, "Document event"),
            Ok(json) => info!(target: "document_events", event = %json, "Document event"),
            Err(e) => warn!(target: "document_events", error = %e, "Unserializable document event"),
        }
    }
}
