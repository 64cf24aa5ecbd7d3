pub mod delay;
pub mod simulator;
pub mod state;

pub use delay::{FixedDelay, NoDelay, RandomDelay};
pub use simulator::{RunSummary, SimulatorTiming, WorkflowSimulator};
pub use state::{RunOutcome, RunState};
