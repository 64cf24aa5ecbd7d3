//! Config validation: schema checks with user-friendly error messages.

use crate::schema::{DelayRange, PulseConfig};
use thiserror::Error;

/// Rolling logs above this size make the console sluggish.
const LOG_CAPACITY_WARN: usize = 10_000;

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

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &PulseConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_backend(config, &mut report);
    validate_simulator(config, &mut report);
    validate_console(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_backend(config: &PulseConfig, report: &mut ValidationReport) {
    let backend = &config.backend;
    let url = backend.base_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        if backend.enabled {
            report.error("backend.baseUrl", format!("'{url}' must start with http:// or https://"));
        } else {
            report.warn(
                "backend.baseUrl",
                format!("'{url}' is not an http(s) URL (backend disabled)"),
            );
        }
    }
    if backend.request_timeout_secs == 0 {
        report.error("backend.requestTimeoutSecs", "requestTimeoutSecs must be >= 1");
    }
}

fn validate_simulator(config: &PulseConfig, report: &mut ValidationReport) {
    let sim = &config.simulator;
    check_range("simulator.dispatchDelayMs", sim.dispatch_delay_ms, report);
    check_range("simulator.processingDelayMs", sim.processing_delay_ms, report);
    if sim.fallback_to_default_scenario {
        report.warn(
            "simulator.fallbackToDefaultScenario",
            "Unknown scenario ids will run the standard flow instead of failing",
        );
    }
}

fn check_range(path: &str, range: DelayRange, report: &mut ValidationReport) {
    if range.min > range.max {
        report.error(path, format!("min ({}) must not exceed max ({})", range.min, range.max));
    }
}

fn validate_console(config: &PulseConfig, report: &mut ValidationReport) {
    let capacity = config.console.log_capacity;
    if capacity == 0 {
        report.error("console.logCapacity", "logCapacity must be >= 1");
    } else if capacity > LOG_CAPACITY_WARN {
        report.warn(
            "console.logCapacity",
            format!("logCapacity {capacity} is large; consider <= {LOG_CAPACITY_WARN}"),
        );
    }
}

fn validate_logging(config: &PulseConfig, report: &mut ValidationReport) {
    if config.logging.level.trim().is_empty() {
        report.error("logging.level", "Log level cannot be empty");
    }
    if let Some(dir) = &config.logging.dir {
        if dir.trim().is_empty() {
            report.error("logging.dir", "Log directory cannot be an empty string; omit it instead");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let report = validate(&PulseConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn bad_url_is_error_only_when_enabled() {
        let mut cfg = PulseConfig::default();
        cfg.backend.base_url = "localhost:8000".to_string();
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "backend.baseUrl");

        cfg.backend.enabled = false;
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn inverted_range_is_error() {
        let mut cfg = PulseConfig::default();
        cfg.simulator.processing_delay_ms = DelayRange::new(2500, 1500);
        let report = validate(&cfg);
        assert!(report.errors.iter().any(|e| e.path == "simulator.processingDelayMs"));
    }

    #[test]
    fn zero_capacity_and_timeout_are_errors() {
        let mut cfg = PulseConfig::default();
        cfg.console.log_capacity = 0;
        cfg.backend.request_timeout_secs = 0;
        assert_eq!(validate(&cfg).errors.len(), 2);
    }

    #[test]
    fn fallback_flag_warns() {
        let mut cfg = PulseConfig::default();
        cfg.simulator.fallback_to_default_scenario = true;
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "simulator.fallbackToDefaultScenario");
    }
}
