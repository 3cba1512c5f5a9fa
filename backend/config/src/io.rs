//! Config file discovery and loading.

use crate::env::resolve_env_vars_with;
use crate::schema::RawConfig;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the config file to load, if any.
/// Priority: `PAPERFORGE_CONFIG` > `<user config dir>/paperforge/config.yaml` (when present).
pub fn config_file_path(env: &HashMap<String, String>) -> Option<PathBuf> {
    if let Some(path) = env.get("PAPERFORGE_CONFIG").filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(path));
    }
    let candidate = dirs::config_dir()?.join("paperforge").join(CONFIG_FILE_NAME);
    if candidate.exists() {
        Some(candidate)
    } else {
        debug!(path = %candidate.display(), "No config file found; using environment only");
        None
    }
}

/// Load and parse a YAML config file, substituting `${VAR}` references from `env`.
pub async fn load_config(path: &Path, env: &HashMap<String, String>) -> Result<RawConfig> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let yaml: serde_yaml::Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    // An empty file parses as null.
    if yaml.is_null() {
        return Ok(RawConfig::default());
    }

    let value = serde_json::to_value(yaml).context("Config YAML is not representable as JSON")?;
    let value = resolve_env_vars_with(&value, env)
        .with_context(|| format!("Failed to resolve env vars in {}", path.display()))?;

    let config: RawConfig = serde_json::from_value(value)
        .with_context(|| format!("Invalid config structure in {}", path.display()))?;

    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let env: HashMap<String, String> =
            [("PAPERFORGE_CONFIG".to_string(), "/etc/paperforge.yaml".to_string())].into();
        assert_eq!(config_file_path(&env), Some(PathBuf::from("/etc/paperforge.yaml")));
    }

    #[tokio::test]
    async fn empty_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();
        let cfg = load_config(&path, &HashMap::new()).await.unwrap();
        assert!(cfg.api_key.is_none());
    }

    #[tokio::test]
    async fn unknown_fields_are_ignored_and_sections_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "rebuilder:\n  mode: native\n  binary: /usr/bin/ocrmypdf\nextraction:\n  minTextChars: 40\nlegacy: true\n",
        )
        .unwrap();
        let cfg = load_config(&path, &HashMap::new()).await.unwrap();
        let rebuilder = cfg.rebuilder.unwrap();
        assert_eq!(rebuilder.mode.as_deref(), Some("native"));
        assert_eq!(rebuilder.binary.as_deref(), Some("/usr/bin/ocrmypdf"));
        assert_eq!(cfg.extraction.unwrap().min_text_chars, Some(40));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = load_config(Path::new("/nonexistent/paperforge.yaml"), &HashMap::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
