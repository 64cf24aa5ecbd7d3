//! Telemetry and structured logging components for Pulse Drive.
//!
//! Handles console output (human or JSON), daily NDJSON file rotation, and
//! mirroring of workflow events to a dedicated log target.

pub mod event_logger;
pub mod logger;

pub use event_logger::{EventLogEntry, EventLogger, WORKFLOW_EVENTS_TARGET};
pub use logger::{init_logger, LOG_FILE_PREFIX};
