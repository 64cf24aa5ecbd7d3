use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;
use crate::error::PulseError;

/// Scenario used by the dashboard's catch-all demo when an id is not recognized.
pub const DEFAULT_SCENARIO_ID: &str = "standard-flow";

/// One agent's unit of work within a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub agent: AgentKind,
    pub start_message: String,
    pub complete_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When set, the step ends in an alert and the remaining steps are skipped.
    #[serde(default)]
    pub force_error: bool,
}

impl WorkflowStep {
    pub fn new(agent: AgentKind, start: impl Into<String>, complete: impl Into<String>) -> Self {
        Self {
            agent,
            start_message: start.into(),
            complete_message: complete.into(),
            error_message: None,
            force_error: false,
        }
    }

    pub fn failing(mut self, error_message: impl Into<String>) -> Self {
        self.force_error = true;
        self.error_message = Some(error_message.into());
        self
    }

    /// Message for the terminal alert event of a forced-error step.
    pub fn alert_message(&self) -> &str {
        self.error_message
            .as_deref()
            .unwrap_or(&self.complete_message)
    }
}

/// An ordered, strictly sequential list of workflow steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub id: String,
    pub label: String,
    pub steps: Vec<WorkflowStep>,
}

impl ScenarioDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            steps,
        }
    }

    /// Index of the first forced-error step, if any.
    pub fn halting_step(&self) -> Option<usize> {
        self.steps.iter().position(|s| s.force_error)
    }
}

/// Static table of demo scenarios.
#[derive(Debug, Clone)]
pub struct ScenarioLibrary {
    scenarios: Vec<ScenarioDefinition>,
    default: ScenarioDefinition,
}

impl ScenarioLibrary {
    /// The scenarios shipped with the dashboard.
    pub fn builtin() -> Self {
        Self {
            scenarios: vec![
                predictive_flow(),
                urgent_failure(),
                ScenarioDefinition::new(
                    "customer-decline",
                    "Customer Declined Case",
                    common_steps(),
                ),
                ueba_anomaly(),
            ],
            default: ScenarioDefinition::new(
                DEFAULT_SCENARIO_ID,
                "Standard Maintenance Flow",
                common_steps(),
            ),
        }
    }

    pub fn from_definitions(
        scenarios: Vec<ScenarioDefinition>,
        default: ScenarioDefinition,
    ) -> Self {
        Self { scenarios, default }
    }

    pub fn get(&self, id: &str) -> Result<&ScenarioDefinition, PulseError> {
        self.scenarios
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| PulseError::UnknownScenario(id.to_string()))
    }

    /// Lookup that substitutes the generic sequence for unknown ids.
    pub fn get_or_default(&self, id: &str) -> &ScenarioDefinition {
        self.get(id).unwrap_or(&self.default)
    }

    pub fn default_scenario(&self) -> &ScenarioDefinition {
        &self.default
    }

    pub fn ids(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioDefinition> {
        self.scenarios.iter()
    }
}

impl Default for ScenarioLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

fn common_steps() -> Vec<WorkflowStep> {
    use AgentKind::*;
    vec![
        WorkflowStep::new(
            DataAnalysis,
            "Ingesting raw telemetry...",
            "Data normalized. No formatting errors.",
        ),
        WorkflowStep::new(
            Diagnosis,
            "Running predictive models...",
            "Analysis complete. Risk score: 42/100.",
        ),
        WorkflowStep::new(
            DigitalTwin,
            "Simulating load parameters...",
            "Simulation PASSED. Model converging.",
        ),
        WorkflowStep::new(
            Voice,
            "Formulating driver notification...",
            "Notification sent via App.",
        ),
        WorkflowStep::new(
            Scheduling,
            "Querying dealer APIs...",
            "Slots retrieved. Appointment logical.",
        ),
        WorkflowStep::new(
            Manufacturing,
            "Aggregating fleet data...",
            "Feedback loop closed with OEM.",
        ),
        WorkflowStep::new(Ueba, "Scanning behavior patterns...", "No anomalies detected."),
    ]
}

fn predictive_flow() -> ScenarioDefinition {
    use AgentKind::*;
    ScenarioDefinition::new(
        "predictive-flow",
        "Full Predictive Maintenance",
        vec![
            WorkflowStep::new(
                DataAnalysis,
                "Streaming sensor buffer...",
                "Ingestion successful. 1.2GB processed.",
            ),
            WorkflowStep::new(
                Diagnosis,
                "Detecting vibration signatures...",
                "Brake pad wear deviation detected (12%).",
            ),
            WorkflowStep::new(
                DigitalTwin,
                "Verifying wear patterns...",
                "Wear pattern CONFIRMED by physics model.",
            ),
            WorkflowStep::new(
                Voice,
                "Drafting alert...",
                "Driver notified: \"Service recommended\".",
            ),
            WorkflowStep::new(
                Scheduling,
                "Booking service...",
                "Tentative slot holding: Tuesday 10AM.",
            ),
            WorkflowStep::new(Ueba, "Monitoring process...", "Security check passed."),
        ],
    )
}

fn urgent_failure() -> ScenarioDefinition {
    use AgentKind::*;
    ScenarioDefinition::new(
        "urgent-failure",
        "Urgent Failure Case",
        vec![
            WorkflowStep::new(
                DataAnalysis,
                "Emergency telemetry stream...",
                "Critical flag received from ECU.",
            ),
            WorkflowStep::new(Diagnosis, "Isolating fault...", "CRITICAL: Hydraulic pressure loss.")
                .failing("CRITICAL FAILURE DETECTED. IMMEDIATE STOP ADVISED."),
            WorkflowStep::new(Voice, "Overrides active...", "Emergency call triggered."),
            WorkflowStep::new(Ueba, "Verifying command origin...", "Command authenticated."),
        ],
    )
}

fn ueba_anomaly() -> ScenarioDefinition {
    use AgentKind::*;
    ScenarioDefinition::new(
        "ueba-anomaly",
        "UEBA Anomaly Case",
        vec![
            WorkflowStep::new(DataAnalysis, "Standard ingestion...", "Data OK."),
            WorkflowStep::new(Ueba, "Analyzing access tokens...", "UNAUTHORIZED ACCESS ATTEMPT.")
                .failing("Session Token Mismatch. Workflow Halted."),
        ],
    )
}
