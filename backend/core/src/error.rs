use thiserror::Error;

/// Top-level error type for the Pulse Drive workflow engine.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("workflow already running: {scenario}")]
    WorkflowActive { scenario: String },

    #[error("live source unavailable: {0}")]
    LiveUnavailable(String),

    #[error("trigger rejected: {0}")]
    TriggerRejected(String),

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PulseError {
    /// True for failures that the caller recovers from by running the local simulator.
    pub fn is_fallback_trigger(&self) -> bool {
        matches!(
            self,
            PulseError::LiveUnavailable(_) | PulseError::TriggerRejected(_)
        )
    }
}
