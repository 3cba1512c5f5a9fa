//! Structured logging for paperforge.
//!
//! Handles subscriber setup (console + optional rolling JSON file), secret
//! redaction, and per-document lifecycle events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{DocumentEvent, EventLogEntry, EventLogger};
pub use logger::{LoggerGuard, init_logger};
pub use redact::redact_sensitive_data;
