use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::SYSTEM_AGENT;

/// A single state change flowing from a producer (simulator or live source)
/// to the event processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub timestamp: DateTime<Utc>,
    pub agent: String,
    pub status: EventStatus,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl WorkflowEvent {
    /// A workflow-scoped event attributed to `System`.
    pub fn system(status: EventStatus, message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at,
            agent: SYSTEM_AGENT.to_string(),
            status,
            message: message.into(),
            kind: EventKind::System,
        }
    }

    pub fn agent(
        agent: impl Into<String>,
        status: EventStatus,
        kind: EventKind,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: at,
            agent: agent.into(),
            status,
            message: message.into(),
            kind,
        }
    }
}

/// Lifecycle status carried by an event. Unrecognized values are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventStatus {
    Idle,
    Running,
    Completed,
    Alert,
    Connected,
    Heartbeat,
    Other(String),
}

impl EventStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EventStatus::Idle => "idle",
            EventStatus::Running => "running",
            EventStatus::Completed => "completed",
            EventStatus::Alert => "alert",
            EventStatus::Connected => "connected",
            EventStatus::Heartbeat => "heartbeat",
            EventStatus::Other(s) => s,
        }
    }
}

impl From<String> for EventStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "idle" => EventStatus::Idle,
            "running" => EventStatus::Running,
            "completed" => EventStatus::Completed,
            "alert" => EventStatus::Alert,
            "connected" => EventStatus::Connected,
            "heartbeat" => EventStatus::Heartbeat,
            _ => EventStatus::Other(s),
        }
    }
}

impl From<EventStatus> for String {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification tag deciding whether an event touches pipeline state or is log-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    System,
    AgentStart,
    AgentComplete,
    AgentError,
    Connected,
    Heartbeat,
    /// Sent by the live backend when a remote run begins.
    WorkflowStart,
    /// Sent by the live backend when a remote run ends.
    WorkflowComplete,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::System => "system",
            EventKind::AgentStart => "agent_start",
            EventKind::AgentComplete => "agent_complete",
            EventKind::AgentError => "agent_error",
            EventKind::Connected => "connected",
            EventKind::Heartbeat => "heartbeat",
            EventKind::WorkflowStart => "workflow_start",
            EventKind::WorkflowComplete => "workflow_complete",
            EventKind::Other(s) => s,
        }
    }

    /// Workflow-level kinds never update a pipeline row.
    pub fn is_system_scoped(&self) -> bool {
        matches!(
            self,
            EventKind::System | EventKind::WorkflowStart | EventKind::WorkflowComplete
        )
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "system" => EventKind::System,
            "agent_start" => EventKind::AgentStart,
            "agent_complete" => EventKind::AgentComplete,
            "agent_error" => EventKind::AgentError,
            "connected" => EventKind::Connected,
            "heartbeat" => EventKind::Heartbeat,
            "workflow_start" => EventKind::WorkflowStart,
            "workflow_complete" => EventKind::WorkflowComplete,
            _ => EventKind::Other(s),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
