//! CLI Status Command
//!
//! Reports the effective configuration and whether the backend answers.

use std::path::Path;

use anyhow::Result;
use serde_json::Value;

use pulsedrive_config::{collect_referenced_vars, load_raw_config, PulseConfig};
use pulsedrive_core::LiveSource;

use crate::app::live_source;
use crate::terminal_output::{note_info, note_success, note_warn, render_table, Column};

pub async fn run(config: &PulseConfig, config_path: &Path) -> Result<()> {
    println!("\nPulse Drive Status\n");

    let rows = vec![
        vec!["Config file".to_string(), config_path.display().to_string()],
        vec!["Backend".to_string(), config.backend.base_url.clone()],
        vec!["Backend enabled".to_string(), config.backend.enabled.to_string()],
        vec!["Log capacity".to_string(), config.console.log_capacity.to_string()],
        vec![
            "Unknown scenarios".to_string(),
            if config.simulator.fallback_to_default_scenario {
                "play standard flow".to_string()
            } else {
                "rejected".to_string()
            },
        ],
    ];
    print!("{}", render_table(&[Column::left("Setting"), Column::left("Value")], &rows));
    println!();

    let raw = load_raw_config(config_path).await?;
    let env_rows = env_reference_rows(&raw, |name| std::env::var(name).ok());
    if !env_rows.is_empty() {
        print!(
            "{}",
            render_table(&[Column::left("Env var"), Column::left("State")], &env_rows)
        );
        println!();
    }

    if !config.backend.enabled {
        note_info("Backend disabled; workflows run on the local simulator");
        return Ok(());
    }

    let source = live_source(config)?;
    if source.health().await {
        note_success(&format!("Backend healthy at {}", source.health_url()));
    } else {
        note_warn(&format!(
            "Backend unreachable at {}; workflows will fall back to the local simulator",
            source.health_url()
        ));
    }
    Ok(())
}

/// One row per `${VAR}` the config file references.
fn env_reference_rows(raw: &Value, lookup: impl Fn(&str) -> Option<String>) -> Vec<Vec<String>> {
    collect_referenced_vars(raw)
        .into_iter()
        .map(|name| {
            let state = match lookup(&name) {
                Some(v) if !v.is_empty() => "set",
                _ => "missing",
            };
            vec![name, state.to_string()]
        })
        .collect()
}
