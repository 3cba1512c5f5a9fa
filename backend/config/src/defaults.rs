//! Config defaults: fills every unset value after file and env have been merged.

use crate::schema::{
    ExtractionConfig, FoldersConfig, GeminiConfig, LoggingConfig, RawConfig, RebuilderConfig,
    WatchConfig,
};
use std::path::PathBuf;

pub const DEFAULT_INBOX: &str = "/docs/inbox";
pub const DEFAULT_PROCESSED: &str = "/docs/processed";
pub const DEFAULT_ERROR: &str = "/docs/error";
pub const DEFAULT_WORKING: &str = "/docs/tmp";

pub const DEFAULT_LANGUAGE: &str = "both";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro-latest";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_PDFTOTEXT_BIN: &str = "pdftotext";

/// Local text must exceed this many trimmed characters to skip remote OCR.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 20;

pub const DEFAULT_REBUILDER_MODE: &str = "docker";
pub const DEFAULT_OCRMYPDF_IMAGE: &str = "jbarlow83/ocrmypdf";
pub const DEFAULT_OCRMYPDF_BIN: &str = "ocrmypdf";

/// Wait after a detection before touching the file.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a merged config.
pub fn apply_all_defaults(config: RawConfig) -> RawConfig {
    let config = apply_folder_defaults(config);
    let config = apply_gemini_defaults(config);
    let config = apply_extraction_defaults(config);
    let config = apply_rebuilder_defaults(config);
    let config = apply_watch_defaults(config);
    apply_logging_defaults(config)
}

/// Folders default to the `/docs` container layout; the host mount defaults
/// to the working folder itself (native runs).
fn apply_folder_defaults(mut config: RawConfig) -> RawConfig {
    let folders = config.folders.get_or_insert_with(FoldersConfig::default);
    folders.inbox.get_or_insert_with(|| PathBuf::from(DEFAULT_INBOX));
    folders.processed.get_or_insert_with(|| PathBuf::from(DEFAULT_PROCESSED));
    folders.error.get_or_insert_with(|| PathBuf::from(DEFAULT_ERROR));
    let working = folders
        .working
        .get_or_insert_with(|| PathBuf::from(DEFAULT_WORKING))
        .clone();
    config.host_working_dir.get_or_insert(working);
    config.language.get_or_insert_with(|| DEFAULT_LANGUAGE.to_string());
    config
}

fn apply_gemini_defaults(mut config: RawConfig) -> RawConfig {
    let gemini = config.gemini.get_or_insert_with(GeminiConfig::default);
    gemini.model.get_or_insert_with(|| DEFAULT_GEMINI_MODEL.to_string());
    gemini.base_url.get_or_insert_with(|| DEFAULT_GEMINI_BASE_URL.to_string());
    gemini.request_timeout_secs.get_or_insert(DEFAULT_REQUEST_TIMEOUT_SECS);
    config
}

fn apply_extraction_defaults(mut config: RawConfig) -> RawConfig {
    let extraction = config.extraction.get_or_insert_with(ExtractionConfig::default);
    extraction.pdftotext_bin.get_or_insert_with(|| DEFAULT_PDFTOTEXT_BIN.to_string());
    extraction.min_text_chars.get_or_insert(DEFAULT_MIN_TEXT_CHARS);
    config
}

fn apply_rebuilder_defaults(mut config: RawConfig) -> RawConfig {
    let rebuilder = config.rebuilder.get_or_insert_with(RebuilderConfig::default);
    rebuilder.mode.get_or_insert_with(|| DEFAULT_REBUILDER_MODE.to_string());
    rebuilder.image.get_or_insert_with(|| DEFAULT_OCRMYPDF_IMAGE.to_string());
    rebuilder.binary.get_or_insert_with(|| DEFAULT_OCRMYPDF_BIN.to_string());
    config
}

fn apply_watch_defaults(mut config: RawConfig) -> RawConfig {
    let watch = config.watch.get_or_insert_with(WatchConfig::default);
    watch.settle_delay_ms.get_or_insert(DEFAULT_SETTLE_DELAY_MS);
    watch.sweep_on_start.get_or_insert(false);
    config
}

fn apply_logging_defaults(mut config: RawConfig) -> RawConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config
}
