//! Config validation: checks with user-friendly error messages.

use crate::schema::{RawConfig, RebuilderMode};
use paperforge_core::LanguageMode;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a defaulted config and return all errors and warnings.
pub fn validate(config: &RawConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_credentials(config, &mut report);
    validate_language(config, &mut report);
    validate_folders(config, &mut report);
    validate_extraction(config, &mut report);
    validate_rebuilder(config, &mut report);
    validate_watch(config, &mut report);
    report
}

fn validate_credentials(config: &RawConfig, report: &mut ValidationReport) {
    match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {}
        _ => report.error(
            "apiKey",
            "GEMINI_API_KEY is not set; the analysis service cannot be reached",
        ),
    }
}

fn validate_language(config: &RawConfig, report: &mut ValidationReport) {
    if let Some(lang) = &config.language {
        if let Err(e) = lang.parse::<LanguageMode>() {
            report.error("language", e);
        }
    }
}

fn validate_folders(config: &RawConfig, report: &mut ValidationReport) {
    let Some(folders) = &config.folders else { return };
    let named: [(&str, &Option<PathBuf>); 4] = [
        ("folders.inbox", &folders.inbox),
        ("folders.processed", &folders.processed),
        ("folders.error", &folders.error),
        ("folders.working", &folders.working),
    ];

    let mut seen = HashSet::new();
    for (path, value) in named {
        let Some(dir) = value else { continue };
        if dir.as_os_str().is_empty() {
            report.error(path, "Folder path cannot be empty");
        } else if !seen.insert(dir.clone()) {
            report.error(path, format!("{} is used for more than one folder", dir.display()));
        }
    }

    if let Some(host) = &config.host_working_dir {
        if host.is_relative() {
            report.warn(
                "hostWorkingDir",
                "Relative host path; docker bind mounts need an absolute path",
            );
        }
    }
}

fn validate_extraction(config: &RawConfig, report: &mut ValidationReport) {
    let Some(extraction) = &config.extraction else { return };
    if extraction.min_text_chars == Some(0) {
        report.warn(
            "extraction.minTextChars",
            "Threshold 0 accepts any non-blank local text; scanned PDFs may skip OCR",
        );
    }
}

fn validate_rebuilder(config: &RawConfig, report: &mut ValidationReport) {
    let Some(rebuilder) = &config.rebuilder else { return };
    if let Some(mode) = &rebuilder.mode {
        if let Err(e) = mode.parse::<RebuilderMode>() {
            report.error("rebuilder.mode", e);
        }
    }
}

fn validate_watch(config: &RawConfig, report: &mut ValidationReport) {
    let Some(watch) = &config.watch else { return };
    if let Some(ms) = watch.settle_delay_ms {
        if ms < 100 {
            report.warn(
                "watch.settleDelayMs",
                format!("Settle delay of {ms}ms may pick up files that are still being written"),
            );
        }
    }
    if watch.poll_interval_ms == Some(0) {
        report.error("watch.pollIntervalMs", "Poll interval must be > 0");
    }
}
