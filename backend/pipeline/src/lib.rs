//! `paperforge-pipeline`: per-document state machine, filing, and the inbox
//! watch loop.

pub mod dispatch;
pub mod filename;
pub mod fs_ops;
pub mod orchestrator;
pub mod state;
pub mod watcher;

#[cfg(test)]
mod test_support;

pub use dispatch::{handle_arrival, run_dispatch_loop, DispatchSummary};
pub use filename::{apply_document_date, base_filename, resolve_destination, sanitize_component};
pub use fs_ops::{ensure_folders, move_file};
pub use orchestrator::{Outcome, Pipeline};
pub use state::{DocumentRecord, DocumentState};
pub use watcher::{arrival_path, is_pdf_candidate, sweep_inbox, InboxWatcher, Readiness, ReadinessCheck};
