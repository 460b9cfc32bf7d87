//! Chat-model seam used by the research agents
//!
//! Every agent turn and the final report synthesis go through
//! [`LLMProvider`]. The Groq client implements it for real runs; tests
//! plug in scripted models that answer per section.

use async_trait::async_trait;

use crate::core::{Message, Result, ToolCall, ToolDefinition};

/// One model reply: either a Markdown answer or a batch of tool calls
#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    /// Markdown text of the reply, empty when the model only called tools
    pub content: String,
    /// Research tools the model asked to run before answering
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<TokenUsage>,
    /// Model that produced the reply, as reported by the endpoint
    pub model: String,
}

impl LLMResponse {
    /// A plain text answer
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The answer text, if the reply carries a non-blank one
    pub fn answer(&self) -> Option<&str> {
        let text = self.content.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// Token accounting reported by the endpoint
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Sampling settings sent with every agent request
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Lower values keep research answers close to the tool findings
    pub temperature: Option<f32>,
    /// Cap on reply length; section reports and the final plan share it
    pub max_tokens: Option<u32>,
    pub stop: Option<Vec<String>>,
}

impl GenerateOptions {
    /// Options from the `[llm]` config table
    pub fn sampling(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
            stop: None,
        }
    }
}

/// A chat model that can answer tasks and request research tools
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Answer without tools; used by the report agent and final synthesis
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse>;

    /// Answer or request calls to any of `tools`
    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse>;

    /// Provider name used in errors and logs
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_reply_has_no_answer() {
        let reply = LLMResponse::text("m", "  \n ");
        assert_eq!(reply.answer(), None);
        assert!(!reply.wants_tools());
        assert_eq!(LLMResponse::text("m", " Paris \n").answer(), Some("Paris"));
    }

    #[test]
    fn test_sampling_options() {
        let options = GenerateOptions::sampling(0.3, 2048);
        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.max_tokens, Some(2048));
        assert!(options.stop.is_none());
    }
}
