//! Research - task prompts and the planning flow

pub mod flow;
pub mod prompts;

pub use flow::{FlowState, PlanOutcome, PlanningFlow, SectionOutcome};
pub use prompts::TaskPrompt;
