//! Pulse Drive runtime configuration schema.
//!
//! Every field has a default, so an empty (or missing) file is a valid config.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_CAPACITY: usize = 50;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PulseConfig {
    /// Live backend connection
    pub backend: BackendConfig,

    /// Local simulator pacing
    pub simulator: SimulatorConfig,

    /// Console view settings
    pub console: ConsoleConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    pub base_url: String,
    /// When false the console never contacts the backend.
    pub enabled: bool,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            enabled: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Inclusive-exclusive millisecond range a pause is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn as_range(&self) -> std::ops::Range<u64> {
        self.min..self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatorConfig {
    /// Pause before each agent starts.
    pub dispatch_delay_ms: DelayRange,
    /// Pause while an agent is "working".
    pub processing_delay_ms: DelayRange,
    /// Pause before the final system event.
    pub finish_delay_ms: u64,
    /// Run the standard flow for unknown scenario ids instead of failing.
    pub fallback_to_default_scenario: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            dispatch_delay_ms: DelayRange::new(800, 1300),
            processing_delay_ms: DelayRange::new(1500, 2500),
            finish_delay_ms: 500,
            fallback_to_default_scenario: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleConfig {
    /// Rolling log size.
    pub log_capacity: usize,
    /// Mirror every workflow event to the `workflow_events` log target.
    pub log_events: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            log_events: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Filter directive (`info`, `pulsedrive_console=debug`, ...).
    pub level: String,
    /// JSON console output.
    pub json: bool,
    /// Directory for daily rolling NDJSON files. No file output when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let cfg: PulseConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, PulseConfig::default());
        assert_eq!(cfg.backend.base_url, "http://localhost:8000");
        assert_eq!(cfg.simulator.dispatch_delay_ms, DelayRange::new(800, 1300));
        assert_eq!(cfg.console.log_capacity, 50);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let yaml = r#"
backend:
  enabled: false
simulator:
  processingDelayMs: { min: 10, max: 20 }
  fallbackToDefaultScenario: true
logging:
  dir: /var/log/pulsedrive
"#;
        let cfg: PulseConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!cfg.backend.enabled);
        assert_eq!(cfg.backend.request_timeout_secs, 10);
        assert_eq!(cfg.simulator.processing_delay_ms.as_range(), 10..20);
        assert_eq!(cfg.simulator.finish_delay_ms, 500);
        assert!(cfg.simulator.fallback_to_default_scenario);
        assert_eq!(cfg.logging.dir.as_deref(), Some("/var/log/pulsedrive"));
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(PulseConfig::default()).unwrap();
        assert!(value["backend"].get("baseUrl").is_some());
        assert!(value["simulator"].get("fallbackToDefaultScenario").is_some());
        assert!(value["logging"].get("dir").is_none());
    }
}
