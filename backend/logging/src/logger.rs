//! Structured Logger
//!
//! Wraps `tracing` to provide human or JSON console output, optional file
//! rotation (NDJSON), and environment-based level control.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Rolling files are named `pulsedrive.YYYY-MM-DD.log`.
pub const LOG_FILE_PREFIX: &str = "pulsedrive";

/// Initialize the global structured logger.
///
/// `RUST_LOG` wins over `level` when set. Console output goes to stderr so
/// rendered workflow views on stdout stay clean. Calling this twice is a no-op.
pub fn init_logger(level: &str, json: bool, log_dir: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level directive: {level}"))?;

    // Rolling file appender: writes NDJSON to `<dir>/pulsedrive.YYYY-MM-DD.log`
    let file_layer = match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix("log")
                .build(dir)
                .with_context(|| format!("Failed to open log directory: {}", dir.display()))?;
            Some(fmt::layer().json().with_writer(appender).with_ansi(false))
        }
        None => None,
    };

    let json_console = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let plain_console = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_console)
        .with(plain_console)
        .with(file_layer)
        .try_init();
    Ok(())
}
