//! `pulsedrive-config`: Pulse Drive runtime configuration.
//!
//! Provides:
//! - Typed config schema with defaults for every field
//! - YAML loading (a missing file means defaults)
//! - `${ENV_VAR}` substitution and `PULSEDRIVE_*` overrides
//! - Validation into errors and warnings

pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use env::{
    apply_env_overrides, apply_env_overrides_with, collect_referenced_vars, resolve_env_vars,
    resolve_env_vars_with, MissingEnvVarError,
};
pub use io::{config_dir, config_file_path, load_config, load_raw_config};
pub use schema::{
    BackendConfig, ConsoleConfig, DelayRange, LoggingConfig, PulseConfig, SimulatorConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load, apply env substitution and overrides, and validate a config file.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<PulseConfig> {
    let raw = load_raw_config(path).await?;
    let value = resolve_env_vars(&raw).context("Failed to resolve env vars in config")?;
    let config: PulseConfig = serde_json::from_value(value)
        .with_context(|| format!("Invalid config at: {}", path.display()))?;
    finish(apply_env_overrides(config))
}

/// Validate a fully resolved config, logging warnings and failing on errors.
pub fn finish(config: PulseConfig) -> Result<PulseConfig> {
    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!("{first} ({} error(s) total)", report.errors.len());
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_and_prepare_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(&path, "console:\n  logCapacity: 0\n").unwrap();
        let err = load_and_prepare(&path).await.unwrap_err();
        assert!(err.to_string().contains("console.logCapacity"));
    }

    #[tokio::test]
    async fn test_load_and_prepare_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(
            &path,
            "simulator:\n  dispatchDelayMs: { min: 0, max: 0 }\nconsole:\n  logEvents: true\n",
        )
        .unwrap();
        let cfg = load_and_prepare(&path).await.unwrap();
        assert_eq!(cfg.simulator.dispatch_delay_ms, DelayRange::new(0, 0));
        assert!(cfg.console.log_events);
    }

    #[test]
    fn test_finish_passes_defaults() {
        assert!(finish(PulseConfig::default()).is_ok());
    }
}
