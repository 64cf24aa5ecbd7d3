//! The workflow console: one place that owns the event bus, the local
//! simulator, the optional live backend and the view state they feed.

pub mod console;
pub mod view;

pub use console::{TriggerOutcome, WorkflowConsole};
pub use view::{ConsoleMode, ConsoleView};
