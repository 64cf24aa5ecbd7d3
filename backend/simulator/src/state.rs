use pulsedrive_core::AgentKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a finished run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    /// A forced-error step raised an alert; later steps did not run.
    Alerted { agent: AgentKind },
}

/// Simulator lifecycle: `Idle -> Running -> Completed | Alerted`, and back to
/// `Running` on the next accepted trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running { scenario: String, run_id: Uuid },
    Completed { scenario: String },
    Alerted { scenario: String, agent: AgentKind },
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running { .. })
    }

    pub fn finished(scenario: String, outcome: &RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed => RunState::Completed { scenario },
            RunOutcome::Alerted { agent } => RunState::Alerted {
                scenario,
                agent: *agent,
            },
        }
    }
}
