use std::fmt;

use serde::{Deserialize, Serialize};

/// Display name used for workflow-scoped (non-agent) events.
pub const SYSTEM_AGENT: &str = "System";

/// One stage of the maintenance pipeline.
///
/// Declaration order is pipeline order; `AgentKind::ALL` preserves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    DataAnalysis,
    Diagnosis,
    DigitalTwin,
    Voice,
    Scheduling,
    Feedback,
    Manufacturing,
    Ueba,
}

impl AgentKind {
    pub const ALL: [AgentKind; 8] = [
        AgentKind::DataAnalysis,
        AgentKind::Diagnosis,
        AgentKind::DigitalTwin,
        AgentKind::Voice,
        AgentKind::Scheduling,
        AgentKind::Feedback,
        AgentKind::Manufacturing,
        AgentKind::Ueba,
    ];

    /// Short key used by the backend on the wire.
    pub fn key(self) -> &'static str {
        match self {
            AgentKind::DataAnalysis => "data_analysis",
            AgentKind::Diagnosis => "diagnosis",
            AgentKind::DigitalTwin => "digital_twin",
            AgentKind::Voice => "voice",
            AgentKind::Scheduling => "scheduling",
            AgentKind::Feedback => "feedback",
            AgentKind::Manufacturing => "manufacturing",
            AgentKind::Ueba => "ueba",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AgentKind::DataAnalysis => "Data Analysis Agent",
            AgentKind::Diagnosis => "Diagnosis Agent",
            AgentKind::DigitalTwin => "Digital Twin Verification",
            AgentKind::Voice => "Voice Engagement Agent",
            AgentKind::Scheduling => "Scheduling Agent",
            AgentKind::Feedback => "Feedback Agent",
            AgentKind::Manufacturing => "Manufacturing Insights",
            AgentKind::Ueba => "UEBA Security Agent",
        }
    }

    /// Icon identifier for the dashboard (lucide icon names).
    pub fn icon(self) -> &'static str {
        match self {
            AgentKind::DataAnalysis => "database",
            AgentKind::Diagnosis => "zap",
            AgentKind::DigitalTwin => "cpu",
            AgentKind::Voice => "message-square",
            AgentKind::Scheduling => "calendar",
            AgentKind::Feedback => "users",
            AgentKind::Manufacturing => "factory",
            AgentKind::Ueba => "shield-check",
        }
    }

    /// 1-based position in the pipeline.
    pub fn order(self) -> u8 {
        match self {
            AgentKind::DataAnalysis => 1,
            AgentKind::Diagnosis => 2,
            AgentKind::DigitalTwin => 3,
            AgentKind::Voice => 4,
            AgentKind::Scheduling => 5,
            AgentKind::Feedback => 6,
            AgentKind::Manufacturing => 7,
            AgentKind::Ueba => 8,
        }
    }

    /// Match a wire key or display name, ignoring surrounding whitespace and ASCII case.
    pub fn from_label(raw: &str) -> Option<AgentKind> {
        let needle = raw.trim();
        AgentKind::ALL.into_iter().find(|kind| {
            kind.key().eq_ignore_ascii_case(needle)
                || kind.display_name().eq_ignore_ascii_case(needle)
        })
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Resolution of the free-text `agent` field carried by events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentRef {
    Known(AgentKind),
    System,
    /// Not in the registry; the raw text is kept verbatim.
    Unknown(String),
}

impl AgentRef {
    /// Total mapping from any agent label to a registry entry.
    pub fn resolve(raw: &str) -> AgentRef {
        if raw.trim().eq_ignore_ascii_case(SYSTEM_AGENT) {
            return AgentRef::System;
        }
        match AgentKind::from_label(raw) {
            Some(kind) => AgentRef::Known(kind),
            None => AgentRef::Unknown(raw.to_string()),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            AgentRef::Known(kind) => kind.display_name(),
            AgentRef::System => SYSTEM_AGENT,
            AgentRef::Unknown(raw) => raw,
        }
    }

    pub fn kind(&self) -> Option<AgentKind> {
        match self {
            AgentRef::Known(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, AgentRef::System)
    }
}
