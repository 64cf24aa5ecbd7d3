use pulsedrive_core::{AgentRef, EventKind, EventStatus, WorkflowEvent};
use tracing::{debug, info, trace};

use crate::log::{LogColor, LogEntry, RollingLog, DEFAULT_LOG_CAPACITY};
use crate::pipeline::{PipelineStepView, PipelineTable};

/// What a single `apply` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Heartbeat: no state changed.
    Skipped,
    Applied {
        pipeline_updated: bool,
        /// A `System` completion cleared the active scenario.
        run_finished: bool,
    },
}

/// Single-writer reducer from events to console view state.
#[derive(Debug, Clone)]
pub struct EventProcessor {
    pipeline: PipelineTable,
    log: RollingLog,
    active_scenario: Option<String>,
    next_log_id: u64,
}

impl EventProcessor {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            pipeline: PipelineTable::new(),
            log: RollingLog::new(log_capacity),
            active_scenario: None,
            next_log_id: 0,
        }
    }

    pub fn apply(&mut self, event: &WorkflowEvent) -> ProcessOutcome {
        if event.kind == EventKind::Heartbeat {
            trace!("Heartbeat ignored");
            return ProcessOutcome::Skipped;
        }

        let agent = AgentRef::resolve(&event.agent);
        let color = classify(&event.status, &agent);

        self.next_log_id += 1;
        self.log.push(LogEntry {
            id: self.next_log_id,
            timestamp: event.timestamp,
            agent: agent.display_name().to_string(),
            message: event.message.clone(),
            color,
        });

        let mut pipeline_updated = false;
        if !event.kind.is_system_scoped() && event.kind != EventKind::Connected {
            match agent.kind() {
                Some(kind) => {
                    pipeline_updated =
                        self.pipeline
                            .update(kind, event.status.clone(), &event.message);
                }
                None => {
                    debug!(agent = %event.agent, "No pipeline row for agent, log only");
                }
            }
        }

        let mut run_finished = false;
        if event.status == EventStatus::Completed && agent.is_system() {
            if let Some(scenario) = self.active_scenario.take() {
                info!(scenario = %scenario, "Workflow run finished");
            }
            run_finished = true;
        }

        ProcessOutcome::Applied {
            pipeline_updated,
            run_finished,
        }
    }

    pub fn set_active_scenario(&mut self, scenario: impl Into<String>) {
        self.active_scenario = Some(scenario.into());
    }

    pub fn clear_active_scenario(&mut self) {
        self.active_scenario = None;
    }

    pub fn active_scenario(&self) -> Option<&str> {
        self.active_scenario.as_deref()
    }

    pub fn pipeline(&self) -> &[PipelineStepView] {
        self.pipeline.rows()
    }

    pub fn log(&self) -> &RollingLog {
        &self.log
    }

    /// Return every row to idle and empty the log. The active scenario is kept.
    pub fn reset(&mut self) {
        self.pipeline.reset();
        self.log.clear();
    }
}

impl Default for EventProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

/// Log color for an event: alerts red, in-progress blue, system and unknown
/// sources gray, everything else green.
pub fn classify(status: &EventStatus, agent: &AgentRef) -> LogColor {
    match (status, agent) {
        (EventStatus::Alert, _) => LogColor::Red,
        (EventStatus::Running, _) => LogColor::Blue,
        (_, AgentRef::System | AgentRef::Unknown(_)) => LogColor::Gray,
        _ => LogColor::Green,
    }
}
