use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use pulsedrive_core::{
    AgentKind, Clock, DelaySource, EventBus, EventKind, EventStatus, PulseError, ScenarioDefinition,
    ScenarioLibrary, SystemClock, WorkflowEvent,
};

use crate::delay::RandomDelay;
use crate::state::{RunOutcome, RunState};

/// Pause ranges between simulated transitions, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorTiming {
    /// Before an agent starts (dispatch latency).
    pub dispatch_ms: Range<u64>,
    /// Between an agent's start and its completion.
    pub processing_ms: Range<u64>,
    /// Before the final workflow-complete event.
    pub finish_ms: u64,
}

impl Default for SimulatorTiming {
    fn default() -> Self {
        Self {
            dispatch_ms: 800..1300,
            processing_ms: 1500..2500,
            finish_ms: 500,
        }
    }
}

/// Result of one simulated run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub scenario: String,
    pub events_emitted: usize,
    pub outcome: RunOutcome,
    /// The agent whose alert halted the run.
    pub halted_at: Option<AgentKind>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Stands in for the backend: plays a scenario as a timed sequence of events.
///
/// At most one run is in flight per simulator; a second `run` while one is
/// active fails with [`PulseError::WorkflowActive`].
pub struct WorkflowSimulator {
    bus: EventBus,
    library: Arc<ScenarioLibrary>,
    delays: Arc<dyn DelaySource>,
    clock: Arc<dyn Clock>,
    timing: SimulatorTiming,
    fallback_to_default: bool,
    state: Mutex<RunState>,
}

impl WorkflowSimulator {
    pub fn new(bus: EventBus, library: Arc<ScenarioLibrary>) -> Self {
        Self {
            bus,
            library,
            delays: Arc::new(RandomDelay),
            clock: Arc::new(SystemClock),
            timing: SimulatorTiming::default(),
            fallback_to_default: false,
            state: Mutex::new(RunState::Idle),
        }
    }

    pub fn with_delays(mut self, delays: Arc<dyn DelaySource>) -> Self {
        self.delays = delays;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timing(mut self, timing: SimulatorTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Play the generic sequence for unknown scenario ids instead of failing.
    pub fn with_default_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_default = enabled;
        self
    }

    pub fn library(&self) -> &ScenarioLibrary {
        &self.library
    }

    pub fn state(&self) -> RunState {
        self.lock_state().clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock_state().is_running()
    }

    /// Run a scenario to completion, emitting every event on the bus.
    pub async fn run(&self, scenario_id: &str) -> Result<RunSummary, PulseError> {
        let scenario = self.resolve(scenario_id)?;
        let run_id = Uuid::new_v4();
        let guard = self.begin(scenario_id, run_id)?;

        let started_at = self.clock.now();
        info!(
            scenario = %scenario_id,
            run_id = %run_id,
            steps = scenario.steps.len(),
            "Starting simulated workflow"
        );

        let mut emitted = 0usize;
        self.publish(
            WorkflowEvent::system(
                EventStatus::Running,
                format!("Workflow '{scenario_id}' initialized."),
                self.clock.now(),
            ),
            &mut emitted,
        );

        let mut outcome = RunOutcome::Completed;
        for step in &scenario.steps {
            self.pause(self.delays.pick(self.timing.dispatch_ms.clone()))
                .await;
            self.publish(
                WorkflowEvent::agent(
                    step.agent.display_name(),
                    EventStatus::Running,
                    EventKind::AgentStart,
                    step.start_message.clone(),
                    self.clock.now(),
                ),
                &mut emitted,
            );

            self.pause(self.delays.pick(self.timing.processing_ms.clone()))
                .await;

            if step.force_error {
                self.publish(
                    WorkflowEvent::agent(
                        step.agent.display_name(),
                        EventStatus::Alert,
                        EventKind::AgentError,
                        step.alert_message(),
                        self.clock.now(),
                    ),
                    &mut emitted,
                );
                warn!(
                    scenario = %scenario_id,
                    run_id = %run_id,
                    agent = %step.agent,
                    "Step raised an alert, halting workflow"
                );
                outcome = RunOutcome::Alerted { agent: step.agent };
                break;
            }

            self.publish(
                WorkflowEvent::agent(
                    step.agent.display_name(),
                    EventStatus::Completed,
                    EventKind::AgentComplete,
                    step.complete_message.clone(),
                    self.clock.now(),
                ),
                &mut emitted,
            );
        }

        self.pause(Duration::from_millis(self.timing.finish_ms)).await;
        self.publish(
            WorkflowEvent::system(
                EventStatus::Completed,
                format!("Workflow '{scenario_id}' execution finished."),
                self.clock.now(),
            ),
            &mut emitted,
        );

        guard.finish(&outcome);
        let finished_at = self.clock.now();
        info!(
            scenario = %scenario_id,
            run_id = %run_id,
            events = emitted,
            outcome = ?outcome,
            "Simulated workflow finished"
        );

        Ok(RunSummary {
            run_id,
            scenario: scenario_id.to_string(),
            events_emitted: emitted,
            halted_at: match outcome {
                RunOutcome::Alerted { agent } => Some(agent),
                RunOutcome::Completed => None,
            },
            outcome,
            started_at,
            finished_at,
        })
    }

    /// Fails the way `run` would fail to start, without starting anything.
    pub fn check(&self, scenario_id: &str) -> Result<(), PulseError> {
        self.resolve(scenario_id)?;
        if let RunState::Running { scenario, .. } = &*self.lock_state() {
            return Err(PulseError::WorkflowActive {
                scenario: scenario.clone(),
            });
        }
        Ok(())
    }

    fn resolve(&self, scenario_id: &str) -> Result<ScenarioDefinition, PulseError> {
        match self.library.get(scenario_id) {
            Ok(scenario) => Ok(scenario.clone()),
            Err(_) if self.fallback_to_default => {
                warn!(scenario = %scenario_id, "Unknown scenario, playing default sequence");
                Ok(self.library.default_scenario().clone())
            }
            Err(e) => Err(e),
        }
    }

    fn begin(&self, scenario_id: &str, run_id: Uuid) -> Result<RunGuard<'_>, PulseError> {
        let mut state = self.lock_state();
        if let RunState::Running { scenario, .. } = &*state {
            warn!(
                requested = %scenario_id,
                active = %scenario,
                "Rejecting trigger while a workflow is running"
            );
            return Err(PulseError::WorkflowActive {
                scenario: scenario.clone(),
            });
        }
        *state = RunState::Running {
            scenario: scenario_id.to_string(),
            run_id,
        };
        Ok(RunGuard {
            simulator: self,
            scenario: scenario_id.to_string(),
            finished: false,
        })
    }

    fn publish(&self, event: WorkflowEvent, emitted: &mut usize) {
        let delivered = self.bus.emit(&event);
        *emitted += 1;
        debug!(
            agent = %event.agent,
            status = %event.status,
            listeners = delivered,
            "Simulator emitted event"
        );
    }

    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RunState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Moves the state machine out of `Running`, even if the run future is dropped.
struct RunGuard<'a> {
    simulator: &'a WorkflowSimulator,
    scenario: String,
    finished: bool,
}

impl RunGuard<'_> {
    fn finish(mut self, outcome: &RunOutcome) {
        *self.simulator.lock_state() = RunState::finished(self.scenario.clone(), outcome);
        self.finished = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(scenario = %self.scenario, "Simulated run abandoned");
            *self.simulator.lock_state() = RunState::Idle;
        }
    }
}
