//! Groq client implementation
//!
//! Async HTTP client for Groq's OpenAI-compatible chat completion API with
//! tool calling support. Any endpoint speaking the same dialect works by
//! pointing `llm.base_url` at it.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::core::{Config, Credential, Credentials, Message, Result, RihlaError, ToolCall, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

/// Groq API client
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

/// Tool call as sent on the wire; arguments are a JSON-encoded string
#[derive(Debug, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl GroqClient {
    /// Create a client against an explicit endpoint
    pub fn new(base_url: impl Into<String>, api_key: SecretString, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        let parsed = Url::parse(&base_url)
            .map_err(|e| RihlaError::config(format!("Invalid LLM base URL '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RihlaError::config(format!(
                "LLM base URL must be http(s): {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RihlaError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Create a client from configuration; fails when GROQ_API_KEY is absent
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self> {
        Self::new(
            &config.llm.base_url,
            credentials.require(Credential::Groq)?,
            Duration::from_secs(config.llm.timeout_secs),
        )
    }

    /// Convert a wire tool call; unparseable arguments are kept as a raw string
    fn to_tool_call(call: WireToolCall) -> ToolCall {
        let arguments = if call.function.arguments.trim().is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_str(&call.function.arguments)
                .unwrap_or(serde_json::Value::String(call.function.arguments))
        };

        ToolCall {
            id: call.id,
            name: call.function.name,
            arguments,
        }
    }

    /// Convert a completion response to LLMResponse
    fn to_llm_response(response: ChatResponse, requested_model: &str) -> Result<LLMResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RihlaError::provider("groq", "response contained no choices"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(Self::to_tool_call)
            .collect();

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let model = if response.model.is_empty() {
            requested_model.to_string()
        } else {
            response.model
        };

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            usage,
            model,
        })
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let options = options.unwrap_or_default();
        let tools = tools.filter(|t| !t.is_empty());

        let request = ChatRequest {
            model,
            messages,
            tools,
            tool_choice: tools.map(|_| "auto"),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stop: options.stop.as_deref(),
        };

        tracing::debug!(
            model,
            messages = messages.len(),
            tools = tools.map_or(0, |t| t.len()),
            "Sending chat completion request"
        );

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    RihlaError::with_context(
                        format!("Cannot connect to LLM endpoint at {}", self.base_url),
                        RihlaError::from(e),
                    )
                } else {
                    RihlaError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RihlaError::provider_status("groq", status, error_text));
        }

        let response_text = response.text().await?;
        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| RihlaError::provider("groq", format!("Failed to parse response: {}", e)))?;

        let llm_response = Self::to_llm_response(chat_response, model)?;
        if let Some(ref usage) = llm_response.usage {
            tracing::debug!(
                model = %llm_response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion finished"
            );
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl LLMProvider for GroqClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.complete(model, messages, None, options).await
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.complete(model, messages, Some(tools), options).await
    }

    fn name(&self) -> &str {
        "groq"
    }
}
