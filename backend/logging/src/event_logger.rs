//! Workflow Event Logger
//!
//! Mirrors every workflow event to the `workflow_events` target, which the
//! JSON file layer writes as one NDJSON line per event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use pulsedrive_core::WorkflowEvent;

pub const WORKFLOW_EVENTS_TARGET: &str = "workflow_events";

#[derive(Debug, Serialize)]
pub struct EventLogEntry<'a> {
    /// Where the event came from (`simulator`, a backend URL, ...).
    pub source: &'a str,
    pub logged_at: DateTime<Utc>,
    pub event: &'a WorkflowEvent,
}

pub struct EventLogger;

impl EventLogger {
    pub fn log_event(source: &str, event: &WorkflowEvent) {
        let entry = EventLogEntry {
            source,
            logged_at: Utc::now(),
            event,
        };
        let payload = serde_json::to_string(&entry).unwrap_or_default();

        info!(
            target: WORKFLOW_EVENTS_TARGET,
            source = %source,
            agent = %event.agent,
            status = %event.status,
            kind = %event.kind,
            event = %payload,
            "{}",
            event.message
        );
    }
}
