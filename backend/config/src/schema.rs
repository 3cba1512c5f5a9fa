//! Configuration schema.
//!
//! [`RawConfig`] mirrors the optional YAML file and collects environment
//! overrides; every field is optional. [`AppConfig`] is the resolved,
//! immutable value handed to each component at startup.

use anyhow::{anyhow, Result};
use paperforge_core::LanguageMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::redact::redact;

// ---------------------------------------------------------------------------
// Raw (file + env) config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folders: Option<FoldersConfig>,

    /// Host-side path of the working directory, bind-mounted into the
    /// rebuilder container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_working_dir: Option<PathBuf>,

    /// Gemini API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// `english`, `french`, or `both`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebuilder: Option<RebuilderConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch: Option<WatchConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldersConfig {
    pub inbox: Option<PathBuf>,
    pub processed: Option<PathBuf>,
    pub error: Option<PathBuf>,
    pub working: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfig {
    pub pdftotext_bin: Option<String>,
    /// Local text must be strictly longer than this (trimmed) to skip OCR.
    pub min_text_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuilderConfig {
    /// `docker` or `native`.
    pub mode: Option<String>,
    pub image: Option<String>,
    pub binary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchConfig {
    pub settle_delay_ms: Option<u64>,
    /// Use a polling watcher with this interval instead of native events.
    pub poll_interval_ms: Option<u64>,
    pub sweep_on_start: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved runtime config
// ---------------------------------------------------------------------------

/// How the OCRmyPDF rebuilder is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebuilderMode {
    Docker,
    Native,
}

impl FromStr for RebuilderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker" => Ok(RebuilderMode::Docker),
            "native" => Ok(RebuilderMode::Native),
            other => Err(format!("unknown rebuilder mode '{other}' (expected docker or native)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderLayout {
    pub inbox: PathBuf,
    pub processed: PathBuf,
    pub error: PathBuf,
    pub working: PathBuf,
}

impl FolderLayout {
    /// All four folders, in creation order.
    pub fn all(&self) -> [&PathBuf; 4] {
        [&self.inbox, &self.processed, &self.error, &self.working]
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiSettings {
    pub model: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSettings {
    pub pdftotext_bin: String,
    pub min_text_chars: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuilderSettings {
    pub mode: RebuilderMode,
    pub image: String,
    pub binary: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSettings {
    pub settle_delay_ms: u64,
    pub poll_interval_ms: Option<u64>,
    pub sweep_on_start: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSettings {
    pub level: String,
    pub log_dir: Option<PathBuf>,
}

/// Immutable process-wide configuration, captured once at startup.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub folders: FolderLayout,
    pub host_working_dir: PathBuf,
    pub api_key: String,
    pub language: LanguageMode,
    pub gemini: GeminiSettings,
    pub extraction: ExtractionSettings,
    pub rebuilder: RebuilderSettings,
    pub watch: WatchSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Convert a defaulted, validated raw config.
    pub fn from_raw(raw: RawConfig) -> Result<Self> {
        let folders = raw.folders.unwrap_or_default();
        let folders = FolderLayout {
            inbox: folders.inbox.ok_or_else(|| missing("folders.inbox"))?,
            processed: folders.processed.ok_or_else(|| missing("folders.processed"))?,
            error: folders.error.ok_or_else(|| missing("folders.error"))?,
            working: folders.working.ok_or_else(|| missing("folders.working"))?,
        };

        let language = raw
            .language
            .as_deref()
            .unwrap_or("both")
            .parse::<LanguageMode>()
            .map_err(|e| anyhow!(e))?;

        let gemini = raw.gemini.unwrap_or_default();
        let extraction = raw.extraction.unwrap_or_default();
        let rebuilder = raw.rebuilder.unwrap_or_default();
        let watch = raw.watch.unwrap_or_default();
        let logging = raw.logging.unwrap_or_default();

        Ok(Self {
            host_working_dir: raw
                .host_working_dir
                .unwrap_or_else(|| folders.working.clone()),
            folders,
            api_key: raw.api_key.ok_or_else(|| missing("apiKey"))?,
            language,
            gemini: GeminiSettings {
                model: gemini.model.ok_or_else(|| missing("gemini.model"))?,
                base_url: gemini.base_url.ok_or_else(|| missing("gemini.baseUrl"))?,
                request_timeout_secs: gemini
                    .request_timeout_secs
                    .ok_or_else(|| missing("gemini.requestTimeoutSecs"))?,
            },
            extraction: ExtractionSettings {
                pdftotext_bin: extraction
                    .pdftotext_bin
                    .ok_or_else(|| missing("extraction.pdftotextBin"))?,
                min_text_chars: extraction
                    .min_text_chars
                    .ok_or_else(|| missing("extraction.minTextChars"))?,
            },
            rebuilder: RebuilderSettings {
                mode: rebuilder
                    .mode
                    .as_deref()
                    .unwrap_or("docker")
                    .parse::<RebuilderMode>()
                    .map_err(|e| anyhow!(e))?,
                image: rebuilder.image.ok_or_else(|| missing("rebuilder.image"))?,
                binary: rebuilder.binary.ok_or_else(|| missing("rebuilder.binary"))?,
            },
            watch: WatchSettings {
                settle_delay_ms: watch
                    .settle_delay_ms
                    .ok_or_else(|| missing("watch.settleDelayMs"))?,
                poll_interval_ms: watch.poll_interval_ms,
                sweep_on_start: watch.sweep_on_start.unwrap_or(false),
            },
            logging: LoggingSettings {
                level: logging.level.ok_or_else(|| missing("logging.level"))?,
                log_dir: logging.log_dir,
            },
        })
    }

    /// JSON snapshot with secrets masked, safe for logs and `doctor` output.
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::to_value(self)
            .map(|v| redact(&v))
            .unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AppConfig({})", self.redacted())
    }
}

fn missing(path: &str) -> anyhow::Error {
    anyhow!("config value '{path}' is not set")
}
