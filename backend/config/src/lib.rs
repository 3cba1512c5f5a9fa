//! `paperforge-config`: runtime configuration for the intake pipeline.
//!
//! Provides:
//! - Typed raw schema (YAML file) and the resolved, immutable [`AppConfig`]
//! - `${ENV_VAR}` substitution in config files
//! - Environment overrides (`GEMINI_API_KEY`, `OUTPUT_LANGUAGE`, `PAPERFORGE_*`)
//! - Default value application
//! - Validation with fatal errors and warnings
//! - Redaction for safe logging/display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_file_path, load_config};
pub use redact::redact;
pub use schema::{
    AppConfig, ExtractionSettings, FolderLayout, GeminiSettings, LoggingSettings, RawConfig,
    RebuilderMode, RebuilderSettings, WatchSettings,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::path::Path;

/// Load configuration from the process environment.
///
/// This is the main entry point at startup: the config file (if any) is
/// located via `PAPERFORGE_CONFIG` or the user config directory.
pub async fn load_from_env() -> Result<AppConfig> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let file = config_file_path(&env);
    load_with(&env, file.as_deref()).await
}

/// Build the runtime config from an explicit environment map and optional
/// YAML file: file values, then environment overrides, then defaults.
pub async fn load_with(env: &HashMap<String, String>, file: Option<&Path>) -> Result<AppConfig> {
    let (config, warnings) = load_with_warnings(env, file).await?;
    for warning in &warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    Ok(config)
}

/// Like [`load_with`], but hands validation warnings back to the caller
/// instead of logging them. Used at startup, before logging is initialized.
pub async fn load_with_warnings(
    env: &HashMap<String, String>,
    file: Option<&Path>,
) -> Result<(AppConfig, Vec<ConfigValidationError>)> {
    let raw = match file {
        Some(path) => load_config(path, env).await?,
        None => RawConfig::default(),
    };
    let raw = apply_env_overrides(raw, env)?;
    let raw = apply_all_defaults(raw);

    let report = validate(&raw);
    if !report.is_valid() {
        let messages: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
        bail!("invalid configuration: {}", messages.join("; "));
    }

    Ok((AppConfig::from_raw(raw)?, report.warnings))
}
