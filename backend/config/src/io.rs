//! Config file discovery and loading.

use crate::schema::PulseConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the Pulse Drive config directory.
/// Priority: `PULSEDRIVE_CONFIG_DIR` env > `~/.pulsedrive/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PULSEDRIVE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".pulsedrive"),
        None => PathBuf::from(".pulsedrive"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read the config file as an untyped tree, before env substitution.
///
/// Returns an empty object if the file doesn't exist (first run).
pub async fn load_raw_config(path: &Path) -> Result<Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    // A comments-only file parses as null.
    let value: Option<Value> = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(value.unwrap_or_else(|| Value::Object(Default::default())))
}

/// Load and parse the config from disk without substitution or overrides.
pub async fn load_config(path: &Path) -> Result<PulseConfig> {
    let value = load_raw_config(path).await?;
    serde_json::from_value(value)
        .with_context(|| format!("Invalid config at: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&config_file_path(dir.path())).await.unwrap();
        assert_eq!(cfg, PulseConfig::default());
    }

    #[tokio::test]
    async fn test_empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(&path, "").unwrap();
        assert_eq!(load_config(&path).await.unwrap(), PulseConfig::default());
    }

    #[tokio::test]
    async fn test_reads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(&path, "backend:\n  baseUrl: http://pulse:9000\n").unwrap();
        let cfg = load_config(&path).await.unwrap();
        assert_eq!(cfg.backend.base_url, "http://pulse:9000");
    }

    #[tokio::test]
    async fn test_malformed_yaml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(&path, "backend: [unclosed").unwrap();
        let err = load_config(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config YAML"));
    }

    #[test]
    fn test_config_file_name() {
        assert_eq!(
            config_file_path(Path::new("/etc/pulsedrive")),
            PathBuf::from("/etc/pulsedrive/config.yaml")
        );
    }
}
