//! Normalization of backend WebSocket frames into [`WorkflowEvent`]s.
//!
//! The backend is loose about its message shape: heartbeat and connected
//! frames carry only `type` and `timestamp`, agents are named by short key
//! (`diagnosis`), and timestamps are usually naive ISO-8601 without a zone.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use pulsedrive_core::{AgentRef, EventKind, EventStatus, PulseError, WorkflowEvent};

/// Kind given to agent frames that carry neither `type` nor `status`.
const AGENT_UPDATE_KIND: &str = "agent_update";

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    agent: Option<String>,
    #[serde(default)]
    agent_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    workflow_id: Option<String>,
}

/// Parse one text frame.
///
/// Returns `Ok(None)` for frames that are not JSON objects (e.g. `pong`).
pub fn parse_message(
    text: &str,
    received_at: DateTime<Utc>,
) -> Result<Option<WorkflowEvent>, PulseError> {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return Ok(None);
    }
    let wire: WireEvent = serde_json::from_str(trimmed)
        .map_err(|e| PulseError::InvalidEvent(format!("{e}: {trimmed}")))?;
    Ok(Some(normalize(wire, received_at)))
}

fn normalize(wire: WireEvent, received_at: DateTime<Utc>) -> WorkflowEvent {
    let agent = wire
        .agent
        .or(wire.agent_id)
        .filter(|a| !a.trim().is_empty())
        .map(|raw| AgentRef::resolve(&raw))
        .unwrap_or(AgentRef::System);

    let status = wire.status.map(EventStatus::from);
    let kind = match wire.kind {
        Some(kind) => EventKind::from(kind),
        None => infer_kind(&agent, status.as_ref()),
    };
    let status = status.unwrap_or_else(|| status_for(&kind));

    let message = wire.message.unwrap_or_else(|| match (&kind, &wire.workflow_id) {
        (EventKind::WorkflowStart, Some(id)) => format!("Workflow '{id}' initiated"),
        (EventKind::WorkflowComplete, Some(id)) => format!("Workflow '{id}' finished."),
        _ => String::new(),
    });

    WorkflowEvent {
        timestamp: wire
            .timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(received_at),
        agent: agent.display_name().to_string(),
        status,
        message,
        kind,
    }
}

fn infer_kind(agent: &AgentRef, status: Option<&EventStatus>) -> EventKind {
    if agent.is_system() {
        return EventKind::System;
    }
    match status {
        Some(EventStatus::Running) => EventKind::AgentStart,
        Some(EventStatus::Completed) => EventKind::AgentComplete,
        Some(EventStatus::Alert) => EventKind::AgentError,
        Some(other) => EventKind::Other(other.as_str().to_string()),
        None => EventKind::Other(AGENT_UPDATE_KIND.to_string()),
    }
}

fn status_for(kind: &EventKind) -> EventStatus {
    match kind {
        EventKind::Heartbeat => EventStatus::Heartbeat,
        EventKind::Connected => EventStatus::Connected,
        EventKind::WorkflowStart | EventKind::AgentStart => EventStatus::Running,
        EventKind::WorkflowComplete | EventKind::AgentComplete => EventStatus::Completed,
        EventKind::AgentError => EventStatus::Alert,
        _ => EventStatus::Idle,
    }
}

/// RFC 3339, or a naive ISO-8601 instant taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
