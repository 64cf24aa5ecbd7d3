//! Environment variable substitution and overrides for config values.
//!
//! Supports `${VAR_NAME}` syntax in string values, resolved at load time.
//! Only uppercase `[A-Z_][A-Z0-9_]*` variable names are matched.
//! `$${}` escapes to a literal `${}`.
//!
//! A string that is exactly one reference (`enabled: ${PULSE_LIVE}`) takes the
//! type of the substituted text when the config field at that path is a boolean
//! or a number. String fields always stay strings.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::schema::PulseConfig;

/// `${VAR}` or the escaped form `$${VAR}`.
static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(\$)?\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid")
});

static WHOLE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$\{([A-Z_][A-Z0-9_]*)\}$").expect("reference pattern is valid"));

pub const ENV_API_URL: &str = "PULSEDRIVE_API_URL";
pub const ENV_LOG: &str = "PULSEDRIVE_LOG";
pub const ENV_OFFLINE: &str = "PULSEDRIVE_OFFLINE";

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config value tree.
///
/// Returns an error if any referenced env var is not set or is empty.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute env vars using a provided map (useful for testing).
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    let shape = serde_json::to_value(PulseConfig::default()).ok();
    substitute_value(value, env, "", shape.as_ref())
}

/// `shape` is the default config at the same position, when there is one.
fn substitute_value(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
    shape: Option<&Value>,
) -> Result<Value> {
    match value {
        Value::String(s) => {
            if let Some(caps) = WHOLE_REFERENCE.captures(s) {
                if let Some(Value::Bool(_) | Value::Number(_)) = shape {
                    return Ok(typed_scalar(lookup(env, &caps[1], path)?));
                }
            }
            Ok(Value::String(substitute_string(s, env, path)?))
        }
        Value::Array(arr) => {
            let result: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]"), None))
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
                let child_shape = shape.and_then(|s| s.get(k));
                result.insert(k.clone(), substitute_value(v, env, &child_path, child_shape)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn lookup<'a>(env: &'a HashMap<String, String>, var_name: &str, path: &str) -> Result<&'a str> {
    match env.get(var_name) {
        Some(val) if !val.is_empty() => Ok(val),
        _ => bail!(MissingEnvVarError {
            var_name: var_name.to_string(),
            config_path: path.to_string(),
        }),
    }
}

/// Booleans and numbers keep their type; everything else stays a string.
fn typed_scalar(raw: &str) -> Value {
    match serde_yaml::from_str::<Value>(raw) {
        Ok(v @ (Value::Bool(_) | Value::Number(_))) => v,
        _ => Value::String(raw.to_string()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for caps in ENV_VAR_PATTERN.captures_iter(s) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&s[last..whole.start()]);
        let var_name = &caps[2];
        if caps.get(1).is_some() {
            out.push_str(&format!("${{{var_name}}}"));
        } else {
            out.push_str(lookup(env, var_name, path)?);
        }
        last = whole.end();
    }
    out.push_str(&s[last..]);
    Ok(out)
}

/// Collect all env var names referenced in a config value tree (for diagnostics).
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    let mut vars = Vec::new();
    collect_vars_recursive(value, &mut vars);
    vars.sort();
    vars.dedup();
    vars
}

fn collect_vars_recursive(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for caps in ENV_VAR_PATTERN.captures_iter(s) {
                if caps.get(1).is_none() {
                    out.push(caps[2].to_string());
                }
            }
        }
        Value::Array(arr) => arr.iter().for_each(|v| collect_vars_recursive(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_vars_recursive(v, out)),
        _ => {}
    }
}

/// Apply `PULSEDRIVE_*` overrides from the process environment.
pub fn apply_env_overrides(config: PulseConfig) -> PulseConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

/// Apply `PULSEDRIVE_*` overrides using the given lookup.
pub fn apply_env_overrides_with(
    mut config: PulseConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> PulseConfig {
    let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = present(ENV_API_URL) {
        debug!(var = ENV_API_URL, "Backend URL overridden from environment");
        config.backend.base_url = url.trim().to_string();
    }
    if let Some(level) = present(ENV_LOG) {
        config.logging.level = level.trim().to_string();
    }
    if let Some(flag) = present(ENV_OFFLINE) {
        if is_truthy(&flag) {
            debug!(var = ENV_OFFLINE, "Backend disabled from environment");
            config.backend.enabled = false;
        }
    }
    config
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
