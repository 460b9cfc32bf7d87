//! Research loop state
//!
//! Tracks the turns of one agent's tool loop and the tool results gathered
//! along the way. Results are fed back to the model as an appended block of
//! findings rather than as separate tool messages.

use serde::Serialize;

use crate::core::ToolResult;

/// State of one agent's tool loop
#[derive(Debug, Clone)]
pub struct AgentLoopState {
    /// Completed turns
    pub turn: usize,
    pub max_turns: usize,
    /// Tool results in the order they arrived
    pub observations: Vec<Observation>,
    /// Set once the model answers without calling a tool
    pub final_answer: Option<String>,
}

impl AgentLoopState {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turn: 0,
            max_turns,
            observations: Vec::new(),
            final_answer: None,
        }
    }

    /// Whether another model call is allowed
    pub fn should_continue(&self) -> bool {
        self.turn < self.max_turns && self.final_answer.is_none()
    }

    /// Findings block appended to the task prompt; empty before the first tool call
    pub fn format_observations(&self) -> String {
        if self.observations.is_empty() {
            return String::new();
        }

        let mut output = String::from("\n\n## Research findings so far\n");
        for (i, obs) in self.observations.iter().enumerate() {
            let status = if obs.success { "" } else { ", failed" };
            output.push_str(&format!(
                "\n### {}. {}{}\n{}\n",
                i + 1,
                obs.tool_name,
                status,
                obs.output
            ));
        }
        output
    }

    pub fn add_observations(&mut self, observations: Vec<Observation>) {
        self.observations.extend(observations);
    }

    pub fn next_turn(&mut self) {
        self.turn += 1;
    }

    /// Count of tool calls that returned data
    pub fn successful_calls(&self) -> usize {
        self.observations.iter().filter(|o| o.success).count()
    }
}

/// One tool result as the model sees it
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub tool_name: String,
    pub success: bool,
    /// Tool output or the error text
    pub output: String,
}

impl Observation {
    pub fn success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn error(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            output: format!("Error: {}", error.into()),
        }
    }
}

impl From<ToolResult> for Observation {
    fn from(result: ToolResult) -> Self {
        if result.success {
            Self::success(result.tool_name, result.output)
        } else {
            Self::error(result.tool_name, result.output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_continue_until_max_turns() {
        let mut state = AgentLoopState::new(2);
        assert!(state.should_continue());

        state.next_turn();
        assert!(state.should_continue());

        state.next_turn();
        assert!(!state.should_continue());
    }

    #[test]
    fn test_final_answer_stops_loop() {
        let mut state = AgentLoopState::new(5);
        state.final_answer = Some("done".to_string());
        assert!(!state.should_continue());
    }

    #[test]
    fn test_format_observations() {
        let mut state = AgentLoopState::new(4);
        assert!(state.format_observations().is_empty());

        state.add_observations(vec![
            Observation::success("web_search", "1. Louvre (https://louvre.fr)"),
            Observation::error("search_images", "pexels error: HTTP 401: bad key"),
        ]);

        let formatted = state.format_observations();
        assert!(formatted.contains("### 1. web_search\n1. Louvre"));
        assert!(formatted.contains("### 2. search_images, failed\nError: pexels error"));
        assert_eq!(state.successful_calls(), 1);
    }

    #[test]
    fn test_from_failed_tool_result() {
        let obs = Observation::from(ToolResult::failure("search_flights", "no offers"));
        assert!(!obs.success);
        assert_eq!(obs.output, "Error: no offers");
    }
}
