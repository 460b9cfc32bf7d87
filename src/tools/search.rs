//! Web search through the Serper Google Search API

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::core::{Config, Result, ToolCall, ToolCategory, ToolDefinition, ToolResult};
use crate::tools::http::{build_client, check_status};
use crate::tools::registry::{names, Tool};

/// Serper web search tool
pub struct WebSearchTool {
    client: Client,
    base_url: String,
    api_key: SecretString,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
    #[serde(default, rename = "knowledgeGraph")]
    knowledge_graph: Option<KnowledgeGraph>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct KnowledgeGraph {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

impl WebSearchTool {
    pub fn new(base_url: impl Into<String>, api_key: SecretString, max_results: u32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            max_results,
        })
    }

    pub fn from_config(config: &Config, api_key: SecretString) -> Result<Self> {
        Self::new(
            &config.tools.serper_url,
            api_key,
            config.tools.search_results,
            Duration::from_secs(config.tools.timeout_secs),
        )
    }

    fn format_results(query: &str, response: &SerperResponse) -> String {
        let mut output = format!("Search results for \"{}\":\n", query);

        if let Some(kg) = &response.knowledge_graph {
            if !kg.title.is_empty() {
                output.push_str(&format!("\n{}: {}\n", kg.title, kg.description));
            }
        }

        if response.organic.is_empty() {
            output.push_str("\nNo results found.");
            return output;
        }

        for (i, result) in response.organic.iter().enumerate() {
            output.push_str(&format!(
                "\n{}. {} ({})\n   {}",
                i + 1,
                result.title,
                result.link,
                result.snippet
            ));
        }
        output
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            names::WEB_SEARCH,
            "Search the web for up-to-date information about places, events and travel",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    }
                },
                "required": ["query"]
            }),
        )
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Search
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let query = call.require_string("query")?;

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", self.api_key.expose_secret())
            .json(&serde_json::json!({ "q": query, "num": self.max_results }))
            .send()
            .await?;
        let response = check_status("serper", response).await?;

        let mut parsed: SerperResponse = response.json().await?;
        parsed.organic.truncate(self.max_results as usize);
        tracing::debug!(query = %query, results = parsed.organic.len(), "Web search finished");

        Ok(ToolResult::success(names::WEB_SEARCH, Self::format_results(&query, &parsed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_formats_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("X-API-KEY", "serper-key"))
            .and(body_partial_json(json!({"q": "Paris museums"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "knowledgeGraph": {"title": "Paris", "description": "Capital of France"},
                "organic": [
                    {"title": "Louvre", "link": "https://louvre.fr", "snippet": "World's largest art museum"},
                    {"title": "Orsay", "link": "https://musee-orsay.fr", "snippet": "Impressionism"}
                ]
            })))
            .mount(&server)
            .await;

        let tool = WebSearchTool::new(
            server.uri(),
            SecretString::from("serper-key".to_string()),
            1,
            Duration::from_secs(5),
        )
        .unwrap();
        let result = tool
            .execute(&ToolCall::new("web_search", json!({"query": "Paris museums"})))
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.output.contains("Capital of France"));
        assert!(result.output.contains("1. Louvre (https://louvre.fr)"));
        assert!(!result.output.contains("Orsay"));
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let tool = WebSearchTool::new(
            "http://127.0.0.1:9",
            SecretString::from("k".to_string()),
            3,
            Duration::from_secs(1),
        )
        .unwrap();
        let err = tool
            .execute(&ToolCall::new("web_search", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::Validation);
    }
}
