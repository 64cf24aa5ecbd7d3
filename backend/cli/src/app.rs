//! Wiring from a loaded [`PulseConfig`] to a ready [`WorkflowConsole`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use pulsedrive_config::{config_dir, config_file_path, load_and_prepare, validate, PulseConfig};
use pulsedrive_console::WorkflowConsole;
use pulsedrive_core::{EventBus, EventKind, ScenarioLibrary, Subscription};
use pulsedrive_live::HttpLiveSource;
use pulsedrive_processor::classify;
use pulsedrive_simulator::{NoDelay, SimulatorTiming, WorkflowSimulator};

use crate::terminal_output::{format_log_line, supports_color};

/// Per-invocation switches layered over the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    /// Never contact the backend.
    pub offline: bool,
    /// Skip every simulated pause.
    pub instant: bool,
}

pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| config_file_path(&config_dir()))
}

/// Load the config and start logging as it describes.
pub async fn bootstrap(path: &Path) -> Result<PulseConfig> {
    let config = load_and_prepare(path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    pulsedrive_logging::init_logger(
        &config.logging.level,
        config.logging.json,
        config.logging.dir.as_deref().map(Path::new),
    )?;

    // Warnings logged during loading predate the subscriber.
    for warning in validate(&config).warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    info!(path = %path.display(), backend = %config.backend.base_url, "Configuration loaded");
    Ok(config)
}

pub fn simulator_timing(config: &PulseConfig, instant: bool) -> SimulatorTiming {
    if instant {
        return SimulatorTiming {
            dispatch_ms: 0..0,
            processing_ms: 0..0,
            finish_ms: 0,
        };
    }
    let sim = &config.simulator;
    SimulatorTiming {
        dispatch_ms: sim.dispatch_delay_ms.as_range(),
        processing_ms: sim.processing_delay_ms.as_range(),
        finish_ms: sim.finish_delay_ms,
    }
}

pub fn live_source(config: &PulseConfig) -> Result<HttpLiveSource> {
    let backend = &config.backend;
    Ok(HttpLiveSource::new(
        backend.base_url.clone(),
        Duration::from_secs(backend.request_timeout_secs),
    )?)
}

/// Build and attach a console for `config`.
pub fn build_console(config: &PulseConfig, flags: RunFlags) -> Result<WorkflowConsole> {
    let bus = EventBus::new();

    let mut simulator = WorkflowSimulator::new(bus.clone(), Arc::new(ScenarioLibrary::builtin()))
        .with_timing(simulator_timing(config, flags.instant))
        .with_default_fallback(config.simulator.fallback_to_default_scenario);
    if flags.instant {
        simulator = simulator.with_delays(Arc::new(NoDelay));
    }

    let mut console = WorkflowConsole::new(bus, Arc::new(simulator), config.console.log_capacity)
        .with_event_logging(config.console.log_events);

    if config.backend.enabled && !flags.offline {
        console = console.with_live_source(Arc::new(live_source(config)?));
    } else {
        info!("Backend disabled, using local simulator only");
    }

    console.attach();
    Ok(console)
}

/// Print every non-heartbeat event on the bus as it arrives.
pub fn print_events(console: &WorkflowConsole) -> Subscription {
    let color = supports_color();
    console.bus().subscribe(move |event| {
        if event.kind == EventKind::Heartbeat {
            return;
        }
        let agent = pulsedrive_core::AgentRef::resolve(&event.agent);
        let line = format_log_line(
            event.timestamp,
            agent.display_name(),
            &event.message,
            classify(&event.status, &agent),
            color,
        );
        println!("{line}");
    })
}
