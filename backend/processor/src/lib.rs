//! Event processing for the agent console.
//!
//! Incoming [`WorkflowEvent`](pulsedrive_core::WorkflowEvent)s are reduced
//! into two projections: a fixed per-agent pipeline table and a bounded
//! rolling log.

pub mod log;
pub mod pipeline;
pub mod processor;

pub use log::{LogColor, LogEntry, RollingLog, DEFAULT_LOG_CAPACITY};
pub use pipeline::{PipelineStepView, PipelineTable};
pub use processor::{classify, EventProcessor, ProcessOutcome};
