//! Environment handling for config values.
//!
//! Two concerns live here:
//! - `${VAR_NAME}` substitution in config file strings, resolved at load time.
//!   Only uppercase `[A-Z_][A-Z0-9_]*` names are matched; `$${VAR}` escapes to
//!   a literal `${VAR}`.
//! - Direct environment overrides (`GEMINI_API_KEY`, `OUTPUT_LANGUAGE`,
//!   `HOST_TEMP_FOLDER`, `PAPERFORGE_*`), applied on top of the file.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::schema::{
    ExtractionConfig, FoldersConfig, GeminiConfig, LoggingConfig, RawConfig, RebuilderConfig,
    WatchConfig,
};

/// Pattern matching `${VAR}` with an optional leading `$` escape.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references from the given environment map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let result: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(result?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut error: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                if error.is_none() {
                    error = Some(MissingEnvVarError {
                        var_name: var_name.to_string(),
                        config_path: path.to_string(),
                    });
                }
                String::new()
            }
        }
    });

    if let Some(err) = error {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Overlay environment variables onto a raw config.
///
/// Empty values count as unset. Numeric and boolean variables that fail to
/// parse are reported with the variable name.
pub fn apply_env_overrides(mut raw: RawConfig, env: &HashMap<String, String>) -> Result<RawConfig> {
    let get = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(key) = get("GEMINI_API_KEY") {
        raw.api_key = Some(key.to_string());
    }
    if let Some(lang) = get("OUTPUT_LANGUAGE") {
        raw.language = Some(lang.to_string());
    }
    if let Some(host) = get("HOST_TEMP_FOLDER") {
        raw.host_working_dir = Some(PathBuf::from(host));
    }

    {
        let folders = raw.folders.get_or_insert_with(FoldersConfig::default);
        if let Some(v) = get("PAPERFORGE_INBOX") {
            folders.inbox = Some(PathBuf::from(v));
        }
        if let Some(v) = get("PAPERFORGE_PROCESSED") {
            folders.processed = Some(PathBuf::from(v));
        }
        if let Some(v) = get("PAPERFORGE_ERROR") {
            folders.error = Some(PathBuf::from(v));
        }
        if let Some(v) = get("PAPERFORGE_WORKING") {
            folders.working = Some(PathBuf::from(v));
        }
    }

    {
        let gemini = raw.gemini.get_or_insert_with(GeminiConfig::default);
        if let Some(v) = get("GEMINI_MODEL") {
            gemini.model = Some(v.to_string());
        }
        if let Some(v) = get("GEMINI_BASE_URL") {
            gemini.base_url = Some(v.trim_end_matches('/').to_string());
        }
        if let Some(v) = get("PAPERFORGE_REQUEST_TIMEOUT_SECS") {
            gemini.request_timeout_secs = Some(parse_var("PAPERFORGE_REQUEST_TIMEOUT_SECS", v)?);
        }
    }

    {
        let extraction = raw.extraction.get_or_insert_with(ExtractionConfig::default);
        if let Some(v) = get("PAPERFORGE_PDFTOTEXT_BIN") {
            extraction.pdftotext_bin = Some(v.to_string());
        }
        if let Some(v) = get("PAPERFORGE_MIN_TEXT_CHARS") {
            extraction.min_text_chars = Some(parse_var("PAPERFORGE_MIN_TEXT_CHARS", v)?);
        }
    }

    {
        let rebuilder = raw.rebuilder.get_or_insert_with(RebuilderConfig::default);
        if let Some(v) = get("PAPERFORGE_REBUILDER") {
            rebuilder.mode = Some(v.to_string());
        }
        if let Some(v) = get("PAPERFORGE_OCRMYPDF_IMAGE") {
            rebuilder.image = Some(v.to_string());
        }
        if let Some(v) = get("PAPERFORGE_OCRMYPDF_BIN") {
            rebuilder.binary = Some(v.to_string());
        }
    }

    {
        let watch = raw.watch.get_or_insert_with(WatchConfig::default);
        if let Some(v) = get("PAPERFORGE_SETTLE_MS") {
            watch.settle_delay_ms = Some(parse_var("PAPERFORGE_SETTLE_MS", v)?);
        }
        if let Some(v) = get("PAPERFORGE_POLL_MS") {
            watch.poll_interval_ms = Some(parse_var("PAPERFORGE_POLL_MS", v)?);
        }
        if let Some(v) = get("PAPERFORGE_SWEEP_ON_START") {
            watch.sweep_on_start = Some(parse_bool("PAPERFORGE_SWEEP_ON_START", v)?);
        }
    }

    {
        let logging = raw.logging.get_or_insert_with(LoggingConfig::default);
        if let Some(v) = get("RUST_LOG") {
            logging.level = Some(v.to_string());
        }
        if let Some(v) = get("PAPERFORGE_LOG_DIR") {
            logging.log_dir = Some(PathBuf::from(v));
        }
    }

    Ok(raw)
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse::<T>()
        .with_context(|| format!("Invalid value for {name}: '{value}'"))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("Invalid value for {name}: '{value}' (expected true or false)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_simple_var() {
        let v = json!({"apiKey": "${GEMINI_API_KEY}"});
        let result = resolve_env_vars_with(&v, &env(&[("GEMINI_API_KEY", "AIza123")])).unwrap();
        assert_eq!(result["apiKey"], "AIza123");
    }

    #[test]
    fn error_on_missing_var() {
        let v = json!({"folders": {"inbox": "${INBOX_DIR}/in"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("INBOX_DIR"));
        assert!(err.to_string().contains("folders.inbox"));
    }

    #[test]
    fn escaped_reference_is_kept_literal() {
        let v = json!({"note": "cost $${DOLLARS} for ${ITEM}"});
        let result = resolve_env_vars_with(&v, &env(&[("ITEM", "paper")])).unwrap();
        assert_eq!(result["note"], "cost ${DOLLARS} for paper");
    }

    #[test]
    fn overrides_populate_raw_config() {
        let raw = apply_env_overrides(
            RawConfig::default(),
            &env(&[
                ("GEMINI_API_KEY", "k"),
                ("OUTPUT_LANGUAGE", "english"),
                ("HOST_TEMP_FOLDER", "/host/tmp"),
                ("PAPERFORGE_POLL_MS", "1500"),
                ("PAPERFORGE_SWEEP_ON_START", "yes"),
                ("GEMINI_BASE_URL", "http://localhost:9999/v1beta/"),
            ]),
        )
        .unwrap();
        assert_eq!(raw.api_key.as_deref(), Some("k"));
        assert_eq!(raw.language.as_deref(), Some("english"));
        assert_eq!(raw.host_working_dir, Some(PathBuf::from("/host/tmp")));
        let watch = raw.watch.unwrap();
        assert_eq!(watch.poll_interval_ms, Some(1500));
        assert_eq!(watch.sweep_on_start, Some(true));
        assert_eq!(
            raw.gemini.unwrap().base_url.as_deref(),
            Some("http://localhost:9999/v1beta")
        );
    }

    #[test]
    fn empty_values_are_ignored() {
        let raw = apply_env_overrides(RawConfig::default(), &env(&[("GEMINI_API_KEY", "  ")]))
            .unwrap();
        assert!(raw.api_key.is_none());
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = apply_env_overrides(
            RawConfig::default(),
            &env(&[("PAPERFORGE_SETTLE_MS", "soon")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("PAPERFORGE_SETTLE_MS"));
    }
}
