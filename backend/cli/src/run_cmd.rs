//! CLI Run and Watch Commands
//!
//! `run` starts one scenario and follows it to completion; `watch` only
//! mirrors the backend's event stream.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

use pulsedrive_config::PulseConfig;
use pulsedrive_console::{ConsoleMode, TriggerOutcome, WorkflowConsole};
use pulsedrive_simulator::RunOutcome;

use crate::app::{build_console, print_events, RunFlags};
use crate::terminal_output::{
    note_error, note_info, note_success, note_warn, render_pipeline, supports_color,
};

/// How often `watch` checks whether the stream dropped.
const MODE_POLL: Duration = Duration::from_millis(500);

pub async fn run(config: &PulseConfig, scenario: &str, flags: RunFlags, json: bool) -> Result<()> {
    let console = build_console(config, flags)?;
    console.connect_live();
    let printer = (!json).then(|| print_events(&console));

    let outcome = console
        .start_scenario(scenario)
        .await
        .with_context(|| format!("Could not start scenario '{scenario}'"))?;

    match outcome {
        TriggerOutcome::Local(handle) => {
            if !json {
                note_info(&format!("Running '{scenario}' on the local simulator"));
            }
            let summary = handle.await.context("Simulator task panicked")??;
            if !json {
                match &summary.outcome {
                    RunOutcome::Completed => note_success(&format!(
                        "Workflow '{scenario}' completed ({} events)",
                        summary.events_emitted
                    )),
                    RunOutcome::Alerted { agent } => {
                        note_warn(&format!("Workflow '{scenario}' halted: {agent} raised an alert"))
                    }
                }
            }
        }
        TriggerOutcome::Live => {
            if !json {
                note_info(&format!("Triggered '{scenario}' on {}", config.backend.base_url));
            }
            follow_live(&console).await?;
        }
    }

    if let Some(sub) = printer {
        sub.unsubscribe();
    }
    print_view(&console, json)
}

/// Wait for the live run to finish, Ctrl+C, or the stream to drop.
async fn follow_live(console: &WorkflowConsole) -> Result<()> {
    loop {
        tokio::select! {
            _ = console.wait_idle() => return Ok(()),
            _ = tokio::signal::ctrl_c() => {
                note_warn("Interrupted; the backend run continues without this console");
                return Ok(());
            }
            _ = tokio::time::sleep(MODE_POLL) => {
                if console.mode() == ConsoleMode::Offline {
                    bail!("Lost the backend event stream before the workflow finished");
                }
            }
        }
    }
}

pub async fn watch(config: &PulseConfig) -> Result<()> {
    if !config.backend.enabled {
        bail!("Backend is disabled in the config; nothing to watch");
    }
    let console = build_console(config, RunFlags::default())?;
    let _printer = print_events(&console);
    console.connect_live();
    note_info(&format!(
        "Watching {} (Ctrl+C to exit)",
        config.backend.base_url
    ));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Watch interrupted");
                break;
            }
            _ = tokio::time::sleep(MODE_POLL) => {
                if console.mode() == ConsoleMode::Offline {
                    note_error("Event stream closed");
                    bail!("Backend event stream unavailable at {}", config.backend.base_url);
                }
            }
        }
    }
    print_view(&console, false)
}

fn print_view(console: &WorkflowConsole, json: bool) -> Result<()> {
    let view = console.view();
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!();
        print!("{}", render_pipeline(&view.pipeline, supports_color()));
    }
    Ok(())
}
