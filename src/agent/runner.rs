//! Agent runner
//!
//! Runs one agent on one task with a ReAct-style loop: the model either
//! calls tools, whose results are appended to the task as findings, or
//! answers. When the turn budget runs out the model is asked once more to
//! answer from what it found.

use std::sync::Arc;
use tokio::task::JoinSet;

use crate::agent::loop_state::{AgentLoopState, Observation};
use crate::agent::registry::AgentProfile;
use crate::core::{Config, Message, Result, RihlaError, ToolCall};
use crate::llm::{GenerateOptions, LLMProvider, LLMResponse};
use crate::research::TaskPrompt;
use crate::tools::ToolRegistry;

/// Executes agent tasks against an LLM provider and a tool registry
#[derive(Clone)]
pub struct AgentRunner {
    llm: Arc<dyn LLMProvider>,
    tools: Arc<ToolRegistry>,
    max_turns: usize,
    options: GenerateOptions,
}

impl AgentRunner {
    pub fn new(llm: Arc<dyn LLMProvider>, tools: Arc<ToolRegistry>, max_turns: usize) -> Self {
        Self {
            llm,
            tools,
            max_turns: max_turns.max(1),
            options: GenerateOptions::default(),
        }
    }

    pub fn from_config(config: &Config, llm: Arc<dyn LLMProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(llm, tools, config.agent.max_turns)
            .with_options(GenerateOptions::sampling(config.llm.temperature, config.llm.max_tokens))
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Run `profile` on `prompt` and return its Markdown answer
    pub async fn run(&self, profile: &AgentProfile, prompt: &TaskPrompt) -> Result<String> {
        let task = prompt.to_message();
        let tool_defs = self.tools.definitions_for(&profile.tools);
        let mut state = AgentLoopState::new(self.max_turns);

        tracing::info!(
            agent = %profile.role,
            model = %profile.model,
            tools = tool_defs.len(),
            "Agent started"
        );

        while state.should_continue() {
            let turn = state.turn + 1;
            let messages = vec![
                Message::system(profile.system_prompt()),
                Message::user(format!("{}{}", task, state.format_observations())),
            ];

            let response = if tool_defs.is_empty() {
                self.llm
                    .chat(&profile.model, &messages, Some(self.options.clone()))
                    .await
            } else {
                self.llm
                    .chat_with_tools(&profile.model, &messages, &tool_defs, Some(self.options.clone()))
                    .await
            }
            .map_err(|e| RihlaError::with_context(format!("{} (turn {})", profile.label, turn), e))?;

            if !response.wants_tools() {
                if response.answer().is_none() {
                    if state.observations.is_empty() {
                        return Err(RihlaError::provider(
                            self.llm.name(),
                            format!("{} returned an empty answer", profile.model),
                        ));
                    }
                    break;
                }
                state.final_answer = Some(response.content);
                break;
            }

            tracing::debug!(
                agent = %profile.role,
                turn,
                calls = response.tool_calls.len(),
                "Executing tool calls"
            );

            let observations = self.execute_tools(profile, &response).await;
            for obs in observations.iter().filter(|o| !o.success) {
                tracing::warn!(agent = %profile.role, tool = %obs.tool_name, "Tool call failed");
            }

            state.add_observations(observations);
            state.next_turn();
        }

        let answer = match state.final_answer.take() {
            Some(answer) => answer,
            None => self.synthesize_from_observations(profile, &task, &state).await?,
        };

        tracing::info!(
            agent = %profile.role,
            turns = state.turn,
            observations = state.observations.len(),
            successful_calls = state.successful_calls(),
            "Agent finished"
        );
        Ok(answer)
    }

    /// Run the requested tool calls concurrently; results keep the call order
    async fn execute_tools(&self, profile: &AgentProfile, response: &LLMResponse) -> Vec<Observation> {
        let mut set: JoinSet<(usize, Observation)> = JoinSet::new();

        for (index, call) in response.tool_calls.iter().enumerate() {
            if !profile.tools.contains(&call.name) {
                let obs = Observation::error(&call.name, format!("tool not available to {}", profile.label));
                set.spawn(async move { (index, obs) });
                continue;
            }

            let tools = Arc::clone(&self.tools);
            let call: ToolCall = call.clone();
            set.spawn(async move {
                let obs = match tools.execute(&call).await {
                    Ok(result) => Observation::from(result),
                    Err(e) => Observation::error(&call.name, e.to_string()),
                };
                (index, obs)
            });
        }

        let mut results = Vec::with_capacity(response.tool_calls.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(pair) => results.push(pair),
                Err(e) => results.push((usize::MAX, Observation::error("tool_task", format!("task failed: {}", e)))),
            }
        }
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, obs)| obs).collect()
    }

    /// Turn budget exhausted: ask for an answer from the gathered findings
    async fn synthesize_from_observations(
        &self,
        profile: &AgentProfile,
        task: &str,
        state: &AgentLoopState,
    ) -> Result<String> {
        tracing::info!(agent = %profile.role, "Turn limit reached, answering from findings");

        let messages = vec![
            Message::system(profile.system_prompt()),
            Message::user(format!(
                "{}{}\n\nYou cannot call tools any more. Write your final answer now from these findings.",
                task,
                state.format_observations()
            )),
        ];

        let response = self
            .llm
            .chat(&profile.model, &messages, Some(self.options.clone()))
            .await
            .map_err(|e| RihlaError::with_context(format!("{} (final answer)", profile.label), e))?;

        if response.content.trim().is_empty() {
            return Err(RihlaError::provider(
                self.llm.name(),
                format!("{} returned an empty answer", profile.model),
            ));
        }
        Ok(response.content)
    }
}
