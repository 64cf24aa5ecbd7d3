use serde::Serialize;

use pulsedrive_processor::{LogEntry, PipelineStepView};

/// Where workflow triggers go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleMode {
    /// Backend reachable: triggers go to it, events come from its stream.
    Live,
    /// Everything runs on the local simulator.
    Offline,
}

impl ConsoleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsoleMode::Live => "live",
            ConsoleMode::Offline => "offline",
        }
    }
}

impl std::fmt::Display for ConsoleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of everything a renderer needs.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleView {
    pub mode: ConsoleMode,
    pub active_scenario: Option<String>,
    pub pipeline: Vec<PipelineStepView>,
    pub log: Vec<LogEntry>,
}

impl ConsoleView {
    pub fn is_idle(&self) -> bool {
        self.active_scenario.is_none()
    }
}
