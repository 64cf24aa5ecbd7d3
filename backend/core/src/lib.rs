pub mod agent;
pub mod bus;
pub mod error;
pub mod event;
pub mod scenario;
pub mod traits;

pub use agent::{AgentKind, AgentRef, SYSTEM_AGENT};
pub use bus::{EventBus, Listener, SubscriberId, Subscription};
pub use error::PulseError;
pub use event::{EventKind, EventStatus, WorkflowEvent};
pub use scenario::{ScenarioDefinition, ScenarioLibrary, WorkflowStep, DEFAULT_SCENARIO_ID};
pub use traits::{
    Clock, DelaySource, ErrorCallback, EventCallback, LiveConnection, LiveSource, SystemClock,
};
