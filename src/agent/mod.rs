//! Agent module - agent profiles and the tool loop that runs them
//!
//! The registry describes who does what; the runner executes one agent on
//! one task.

pub mod loop_state;
pub mod registry;
pub mod runner;

pub use loop_state::{AgentLoopState, Observation};
pub use registry::{AgentProfile, AgentRegistry, AgentRole};
pub use runner::AgentRunner;
