use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pulsedrive_core::{
    EventBus, LiveConnection, LiveSource, PulseError, Subscription, WorkflowEvent,
};
use pulsedrive_logging::EventLogger;
use pulsedrive_processor::{EventProcessor, ProcessOutcome};
use pulsedrive_simulator::{RunSummary, WorkflowSimulator};

use crate::view::{ConsoleMode, ConsoleView};

/// How a started scenario is being executed.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// The backend accepted the trigger; events arrive on the live stream.
    Live,
    /// The local simulator is playing the scenario.
    Local(JoinHandle<Result<RunSummary, PulseError>>),
}

/// Composition root for one workflow view.
///
/// The processor is the single writer of view state. At most one scenario is
/// active at a time; the marker clears when a `System` completion event is
/// processed, whichever source produced it.
pub struct WorkflowConsole {
    bus: EventBus,
    simulator: Arc<WorkflowSimulator>,
    processor: Arc<Mutex<EventProcessor>>,
    live: Option<Arc<dyn LiveSource>>,
    mode: Arc<Mutex<ConsoleMode>>,
    active_tx: Arc<watch::Sender<Option<String>>>,
    log_events: bool,
    subscriptions: Mutex<Vec<Subscription>>,
    connection: Mutex<Option<LiveConnection>>,
}

impl WorkflowConsole {
    pub fn new(
        bus: EventBus,
        simulator: Arc<WorkflowSimulator>,
        processor_capacity: usize,
    ) -> Self {
        let (active_tx, _) = watch::channel(None);
        Self {
            bus,
            simulator,
            processor: Arc::new(Mutex::new(EventProcessor::new(processor_capacity))),
            live: None,
            mode: Arc::new(Mutex::new(ConsoleMode::Offline)),
            active_tx: Arc::new(active_tx),
            log_events: false,
            subscriptions: Mutex::new(Vec::new()),
            connection: Mutex::new(None),
        }
    }

    /// Route triggers to `source` until it fails.
    pub fn with_live_source(mut self, source: Arc<dyn LiveSource>) -> Self {
        self.live = Some(source);
        *lock(&self.mode) = ConsoleMode::Live;
        self
    }

    /// Mirror every bus event to the `workflow_events` log target.
    pub fn with_event_logging(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn mode(&self) -> ConsoleMode {
        *lock(&self.mode)
    }

    /// Subscribe the processor (and the event logger) to the bus. Idempotent.
    pub fn attach(&self) {
        let mut subs = lock(&self.subscriptions);
        if !subs.is_empty() {
            return;
        }

        let processor = Arc::clone(&self.processor);
        let active_tx = Arc::clone(&self.active_tx);
        subs.push(self.bus.subscribe(move |event| {
            let outcome = lock(&processor).apply(event);
            if let ProcessOutcome::Applied {
                run_finished: true, ..
            } = outcome
            {
                active_tx.send_replace(None);
            }
        }));

        if self.log_events {
            let mode = Arc::clone(&self.mode);
            subs.push(self.bus.subscribe(move |event: &WorkflowEvent| {
                let source = match *lock(&mode) {
                    ConsoleMode::Live => "live",
                    ConsoleMode::Offline => "simulator",
                };
                EventLogger::log_event(source, event);
            }));
        }
        debug!(listeners = subs.len(), "Console attached to event bus");
    }

    /// Unsubscribe from the bus and close any live stream.
    pub fn detach(&self) {
        for sub in lock(&self.subscriptions).drain(..) {
            sub.unsubscribe();
        }
        if let Some(conn) = lock(&self.connection).take() {
            conn.dispose();
        }
    }

    /// Open the live event stream. Its first failure switches the console offline.
    ///
    /// A scenario the backend was running when the stream failed can no longer
    /// report completion, so its marker is released and later starts go to the
    /// local simulator. Without a live source this does nothing.
    pub fn connect_live(&self) {
        let Some(live) = &self.live else { return };
        if lock(&self.connection).is_some() {
            return;
        }

        let bus = self.bus.clone();
        let mode = Arc::clone(&self.mode);
        let processor = Arc::clone(&self.processor);
        let active_tx = Arc::clone(&self.active_tx);
        let name = live.name().to_string();
        let conn = live.connect(
            Arc::new(move |event| {
                bus.emit(&event);
            }),
            Box::new(move |err| {
                warn!(
                    source = %name,
                    error = %err,
                    "Live stream failed, switching to offline mode"
                );
                *lock(&mode) = ConsoleMode::Offline;
                let abandoned = {
                    let mut processor = lock(&processor);
                    let active = processor.active_scenario().map(str::to_string);
                    processor.clear_active_scenario();
                    active
                };
                if let Some(scenario) = abandoned {
                    warn!(scenario = %scenario, "Backend run lost with the live stream");
                    active_tx.send_replace(None);
                }
            }),
        );
        *lock(&self.connection) = Some(conn);
        info!(source = %live.name(), "Live stream requested");
    }

    /// Start `scenario_id` on the backend when live, else on the local simulator.
    pub async fn start_scenario(&self, scenario_id: &str) -> Result<TriggerOutcome, PulseError> {
        self.mark_active(scenario_id)?;

        if let (ConsoleMode::Live, Some(live)) = (self.mode(), &self.live) {
            match live.trigger(scenario_id).await {
                Ok(()) => {
                    info!(
                        scenario = %scenario_id,
                        source = %live.name(),
                        "Scenario triggered on backend"
                    );
                    return Ok(TriggerOutcome::Live);
                }
                Err(e) if e.is_fallback_trigger() => {
                    warn!(
                        scenario = %scenario_id,
                        error = %e,
                        "Backend trigger failed, running locally"
                    );
                }
                Err(e) => {
                    self.clear_active();
                    return Err(e);
                }
            }
        }

        self.start_local(scenario_id)
    }

    fn start_local(&self, scenario_id: &str) -> Result<TriggerOutcome, PulseError> {
        if let Err(e) = self.simulator.check(scenario_id) {
            self.clear_active();
            return Err(e);
        }

        let simulator = Arc::clone(&self.simulator);
        let processor = Arc::clone(&self.processor);
        let active_tx = Arc::clone(&self.active_tx);
        let id = scenario_id.to_string();
        let handle = tokio::spawn(async move {
            let result = simulator.run(&id).await;
            if let Err(e) = &result {
                warn!(scenario = %id, error = %e, "Local run did not start");
                lock(&processor).clear_active_scenario();
                active_tx.send_replace(None);
            }
            result
        });
        info!(scenario = %scenario_id, "Scenario started on local simulator");
        Ok(TriggerOutcome::Local(handle))
    }

    fn mark_active(&self, scenario_id: &str) -> Result<(), PulseError> {
        let mut processor = lock(&self.processor);
        if let Some(active) = processor.active_scenario() {
            return Err(PulseError::WorkflowActive {
                scenario: active.to_string(),
            });
        }
        processor.set_active_scenario(scenario_id);
        self.active_tx.send_replace(Some(scenario_id.to_string()));
        Ok(())
    }

    fn clear_active(&self) {
        lock(&self.processor).clear_active_scenario();
        self.active_tx.send_replace(None);
    }

    pub fn active_scenario(&self) -> Option<String> {
        self.active_tx.borrow().clone()
    }

    /// Observe the active scenario as it changes.
    pub fn watch_active(&self) -> watch::Receiver<Option<String>> {
        self.active_tx.subscribe()
    }

    /// Resolve once no scenario is active.
    pub async fn wait_idle(&self) {
        let mut rx = self.active_tx.subscribe();
        let _ = rx.wait_for(Option::is_none).await;
    }

    /// Clear the pipeline and log. The active scenario is unaffected.
    pub fn reset_view(&self) {
        lock(&self.processor).reset();
    }

    pub fn view(&self) -> ConsoleView {
        let processor = lock(&self.processor);
        ConsoleView {
            mode: self.mode(),
            active_scenario: processor.active_scenario().map(str::to_string),
            pipeline: processor.pipeline().to_vec(),
            log: processor.log().to_vec(),
        }
    }
}

impl Drop for WorkflowConsole {
    fn drop(&mut self) {
        self.detach();
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use pulsedrive_core::{
        AgentKind, ErrorCallback, EventCallback, EventKind, EventStatus, ScenarioLibrary,
    };
    use pulsedrive_simulator::{FixedDelay, NoDelay, SimulatorTiming};

    #[derive(Default)]
    struct ScriptedSource {
        reject_trigger: bool,
        fail_connect: bool,
        replay: Vec<WorkflowEvent>,
        triggers: AtomicUsize,
    }

    #[async_trait]
    impl LiveSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn connect(&self, on_event: EventCallback, on_error: ErrorCallback) -> LiveConnection {
            for event in &self.replay {
                on_event(event.clone());
            }
            if self.fail_connect {
                on_error(PulseError::LiveUnavailable("connection refused".into()));
            }
            LiveConnection::closed()
        }

        async fn trigger(&self, scenario_id: &str) -> Result<(), PulseError> {
            self.triggers.fetch_add(1, Ordering::SeqCst);
            if self.reject_trigger {
                Err(PulseError::TriggerRejected(format!("503 for {scenario_id}")))
            } else {
                Ok(())
            }
        }

        async fn health(&self) -> bool {
            !self.reject_trigger
        }
    }

    fn instant_simulator(bus: &EventBus) -> Arc<WorkflowSimulator> {
        Arc::new(
            WorkflowSimulator::new(bus.clone(), Arc::new(ScenarioLibrary::builtin()))
                .with_delays(Arc::new(NoDelay))
                .with_timing(SimulatorTiming {
                    finish_ms: 0,
                    ..SimulatorTiming::default()
                }),
        )
    }

    fn offline_console() -> WorkflowConsole {
        let bus = EventBus::new();
        let console = WorkflowConsole::new(bus.clone(), instant_simulator(&bus), 50);
        console.attach();
        console
    }

    fn live_console(source: Arc<ScriptedSource>) -> WorkflowConsole {
        let bus = EventBus::new();
        let console =
            WorkflowConsole::new(bus.clone(), instant_simulator(&bus), 50).with_live_source(source);
        console.attach();
        console
    }

    async fn finish(outcome: TriggerOutcome) -> RunSummary {
        match outcome {
            TriggerOutcome::Local(handle) => handle.await.unwrap().unwrap(),
            TriggerOutcome::Live => panic!("expected a local run"),
        }
    }

    #[tokio::test]
    async fn test_offline_run_updates_view() {
        let console = offline_console();
        assert_eq!(console.mode(), ConsoleMode::Offline);

        let summary = finish(console.start_scenario("predictive-flow").await.unwrap()).await;
        console.wait_idle().await;

        let view = console.view();
        assert!(view.is_idle());
        assert_eq!(view.log.len(), summary.events_emitted);
        assert_eq!(view.log.first().unwrap().message, "Workflow 'predictive-flow' initialized.");
        assert_eq!(
            view.log.last().unwrap().message,
            "Workflow 'predictive-flow' execution finished."
        );
        let completed = view
            .pipeline
            .iter()
            .filter(|r| r.status == EventStatus::Completed)
            .count();
        assert_eq!(completed, (summary.events_emitted - 2) / 2);
    }

    #[tokio::test]
    async fn test_urgent_failure_leaves_diagnosis_in_alert() {
        let console = offline_console();
        finish(console.start_scenario("urgent-failure").await.unwrap()).await;

        let view = console.view();
        let diagnosis = view.pipeline.iter().find(|r| r.agent == AgentKind::Diagnosis).unwrap();
        assert_eq!(diagnosis.status, EventStatus::Alert);
        assert_eq!(diagnosis.last_log, "CRITICAL FAILURE DETECTED. IMMEDIATE STOP ADVISED.");
        let scheduling = view.pipeline.iter().find(|r| r.agent == AgentKind::Scheduling).unwrap();
        assert_eq!(scheduling.status, EventStatus::Idle);
        assert!(view.is_idle());
    }

    #[tokio::test]
    async fn test_live_trigger_success_skips_simulator() {
        let source = Arc::new(ScriptedSource::default());
        let console = live_console(Arc::clone(&source));

        let outcome = console.start_scenario("predictive-flow").await.unwrap();
        assert!(matches!(outcome, TriggerOutcome::Live));
        assert_eq!(source.triggers.load(Ordering::SeqCst), 1);
        assert_eq!(console.active_scenario().as_deref(), Some("predictive-flow"));

        // The backend's completion frame arrives on the bus.
        console.bus().emit(&WorkflowEvent::system(
            EventStatus::Completed,
            "Workflow 'predictive-flow' finished.",
            Utc::now(),
        ));
        tokio::time::timeout(Duration::from_secs(1), console.wait_idle())
            .await
            .unwrap();
        assert!(console.view().is_idle());
    }

    #[tokio::test]
    async fn test_rejected_trigger_falls_back_to_local_run() {
        let source = Arc::new(ScriptedSource {
            reject_trigger: true,
            ..Default::default()
        });
        let console = live_console(Arc::clone(&source));

        let summary = finish(console.start_scenario("urgent-failure").await.unwrap()).await;
        assert_eq!(summary.scenario, "urgent-failure");
        assert_eq!(source.triggers.load(Ordering::SeqCst), 1);

        let view = console.view();
        assert_eq!(view.active_scenario, None);
        assert!(view
            .log
            .iter()
            .any(|e| e.message == "Workflow 'urgent-failure' initialized."));
    }

    #[tokio::test]
    async fn test_second_start_rejected_while_active() {
        let bus = EventBus::new();
        let sim = Arc::new(
            WorkflowSimulator::new(bus.clone(), Arc::new(ScenarioLibrary::builtin()))
                .with_delays(Arc::new(FixedDelay(Duration::from_millis(5))))
                .with_timing(SimulatorTiming {
                    finish_ms: 0,
                    ..SimulatorTiming::default()
                }),
        );
        let console = WorkflowConsole::new(bus, sim, 50);
        console.attach();

        let first = console.start_scenario("predictive-flow").await.unwrap();
        let err = console.start_scenario("urgent-failure").await.unwrap_err();
        assert!(matches!(
            err,
            PulseError::WorkflowActive { ref scenario } if scenario == "predictive-flow"
        ));

        finish(first).await;
        console.wait_idle().await;
        let again = console.start_scenario("urgent-failure").await.unwrap();
        finish(again).await;
    }

    #[tokio::test]
    async fn test_unknown_scenario_clears_marker() {
        let console = offline_console();
        let err = console.start_scenario("no-such-flow").await.unwrap_err();
        assert!(matches!(err, PulseError::UnknownScenario(_)));
        assert_eq!(console.active_scenario(), None);
        assert!(console.view().is_idle());

        finish(console.start_scenario("ueba-anomaly").await.unwrap()).await;
    }

    #[tokio::test]
    async fn test_connect_failure_switches_offline() {
        let source = Arc::new(ScriptedSource {
            fail_connect: true,
            ..Default::default()
        });
        let console = live_console(Arc::clone(&source));
        assert_eq!(console.mode(), ConsoleMode::Live);

        console.connect_live();
        assert_eq!(console.mode(), ConsoleMode::Offline);

        finish(console.start_scenario("predictive-flow").await.unwrap()).await;
        assert_eq!(source.triggers.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_events_reach_processor() {
        let source = Arc::new(ScriptedSource {
            replay: vec![
                WorkflowEvent::agent(
                    "System",
                    EventStatus::Heartbeat,
                    EventKind::Heartbeat,
                    "",
                    Utc::now(),
                ),
                WorkflowEvent::agent(
                    "Voice Engagement Agent",
                    EventStatus::Running,
                    EventKind::AgentStart,
                    "Calling customer...",
                    Utc::now(),
                ),
            ],
            ..Default::default()
        });
        let console = live_console(source);
        console.connect_live();

        let view = console.view();
        assert_eq!(view.mode, ConsoleMode::Live);
        assert_eq!(view.log.len(), 1);
        let voice = view.pipeline.iter().find(|r| r.agent == AgentKind::Voice).unwrap();
        assert_eq!(voice.status, EventStatus::Running);
        assert_eq!(voice.last_log, "Calling customer...");
    }

    #[tokio::test]
    async fn test_unmapped_agent_is_logged_without_row_change() {
        let source = Arc::new(ScriptedSource {
            replay: vec![WorkflowEvent::agent(
                "Voice Agent",
                EventStatus::Running,
                EventKind::AgentStart,
                "Calling customer...",
                Utc::now(),
            )],
            ..Default::default()
        });
        let console = live_console(source);
        console.connect_live();

        let view = console.view();
        assert_eq!(view.log.len(), 1);
        assert_eq!(view.log[0].agent, "Voice Agent");
        assert!(view.pipeline.iter().all(|r| r.status == EventStatus::Idle));
    }

    #[tokio::test]
    async fn test_stream_loss_releases_backend_run() {
        let source = Arc::new(ScriptedSource {
            fail_connect: true,
            ..Default::default()
        });
        let console = live_console(Arc::clone(&source));

        let outcome = console.start_scenario("predictive-flow").await.unwrap();
        assert!(matches!(outcome, TriggerOutcome::Live));
        assert_eq!(console.active_scenario().as_deref(), Some("predictive-flow"));

        console.connect_live();
        assert_eq!(console.mode(), ConsoleMode::Offline);
        assert_eq!(console.active_scenario(), None);
        assert!(console.view().is_idle());

        let summary = finish(console.start_scenario("predictive-flow").await.unwrap()).await;
        assert_eq!(summary.scenario, "predictive-flow");
        assert_eq!(source.triggers.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_detach_stops_updates() {
        let console = offline_console();
        console.detach();
        console.bus().emit(&WorkflowEvent::system(EventStatus::Running, "x", Utc::now()));
        assert!(console.view().log.is_empty());
    }

    #[tokio::test]
    async fn test_watch_reports_activity() {
        let console = offline_console();
        let mut rx = console.watch_active();
        let outcome = console.start_scenario("customer-decline").await.unwrap();
        assert_eq!(rx.borrow_and_update().as_deref(), Some("customer-decline"));
        finish(outcome).await;
        assert_eq!(*rx.borrow_and_update(), None);
    }
}
