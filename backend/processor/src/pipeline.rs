use pulsedrive_core::{AgentKind, EventStatus};
use serde::{Deserialize, Serialize};

/// Placeholder shown before an agent has reported anything.
const IDLE_LOG: &str = "Waiting...";

/// Current displayed state of one pipeline row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStepView {
    pub agent: AgentKind,
    pub name: String,
    pub status: EventStatus,
    pub last_log: String,
}

impl PipelineStepView {
    pub fn idle(agent: AgentKind) -> Self {
        Self {
            agent,
            name: agent.display_name().to_string(),
            status: EventStatus::Idle,
            last_log: IDLE_LOG.to_string(),
        }
    }
}

/// One row per registered agent, in pipeline order. Rows are never added or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineTable {
    rows: Vec<PipelineStepView>,
}

impl PipelineTable {
    pub fn new() -> Self {
        Self {
            rows: AgentKind::ALL.into_iter().map(PipelineStepView::idle).collect(),
        }
    }

    /// Overwrite a row's status and last message. Returns false when no row matches.
    pub fn update(&mut self, agent: AgentKind, status: EventStatus, message: &str) -> bool {
        match self.rows.iter_mut().find(|row| row.agent == agent) {
            Some(row) => {
                row.status = status;
                row.last_log = message.to_string();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, agent: AgentKind) -> Option<&PipelineStepView> {
        self.rows.iter().find(|row| row.agent == agent)
    }

    pub fn rows(&self) -> &[PipelineStepView] {
        &self.rows
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for PipelineTable {
    fn default() -> Self {
        Self::new()
    }
}
