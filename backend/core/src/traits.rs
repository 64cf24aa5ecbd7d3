use std::ops::Range;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PulseError;
use crate::event::WorkflowEvent;

/// Receives every event parsed from a live stream.
pub type EventCallback = std::sync::Arc<dyn Fn(WorkflowEvent) + Send + Sync>;

/// Receives the single connection-level failure of a live stream.
pub type ErrorCallback = Box<dyn FnOnce(PulseError) + Send>;

/// A remote event source: the real backend when it is reachable.
#[async_trait]
pub trait LiveSource: Send + Sync {
    /// Human-readable name (e.g., the backend URL).
    fn name(&self) -> &str;

    /// Open the event stream in the background.
    ///
    /// Inbound messages are normalized and passed to `on_event`. Any
    /// connection-level failure invokes `on_error` once and ends the stream.
    fn connect(&self, on_event: EventCallback, on_error: ErrorCallback) -> LiveConnection;

    /// Ask the remote system to start the named scenario.
    async fn trigger(&self, scenario_id: &str) -> Result<(), PulseError>;

    /// Whether the backend answers its health endpoint.
    async fn health(&self) -> bool;
}

/// Handle to an open live stream. Disposing (or dropping) it closes the stream.
pub struct LiveConnection {
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl LiveConnection {
    pub fn new(dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A connection with nothing to close.
    pub fn closed() -> Self {
        Self { dispose: None }
    }

    pub fn dispose(mut self) {
        if let Some(f) = self.dispose.take() {
            f();
        }
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        if let Some(f) = self.dispose.take() {
            f();
        }
    }
}

impl std::fmt::Debug for LiveConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveConnection")
            .field("open", &self.dispose.is_some())
            .finish()
    }
}

/// Source of event timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Picks a concrete pause from a half-open millisecond range.
pub trait DelaySource: Send + Sync {
    fn pick(&self, range_ms: Range<u64>) -> Duration;
}
