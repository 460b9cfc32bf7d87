//! Encyclopedia article search through the MediaWiki API

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

use crate::core::{Config, Result, ToolCall, ToolCategory, ToolDefinition, ToolResult};
use crate::tools::http::{build_client, check_status};
use crate::tools::registry::{names, Tool};

const MAX_ARTICLES: &str = "5";

/// Wikipedia article search tool
pub struct WikiArticlesTool {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
    #[serde(default)]
    snippet: String,
}

/// Remove the highlight markup MediaWiki puts in snippets
pub(crate) fn strip_html(text: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
    tags.replace_all(text, "")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

impl WikiArticlesTool {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.tools.wikipedia_url,
            Duration::from_secs(config.tools.timeout_secs),
        )
    }

    fn article_url(&self, title: &str) -> String {
        format!("{}/wiki/{}", self.base_url, title.replace(' ', "_"))
    }
}

#[async_trait]
impl Tool for WikiArticlesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            names::WIKI_ARTICLES,
            "Search Wikipedia articles about a place, landmark or topic",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search terms in English"
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
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", query.as_str()),
                ("srlimit", MAX_ARTICLES),
            ])
            .send()
            .await?;
        let response = check_status("wikipedia", response).await?;
        let parsed: SearchResponse = response.json().await?;
        let hits = parsed.query.map(|q| q.search).unwrap_or_default();

        if hits.is_empty() {
            return Ok(ToolResult::success(
                names::WIKI_ARTICLES,
                format!("No Wikipedia articles found for \"{}\".", query),
            ));
        }

        let mut output = format!("Wikipedia articles for \"{}\":\n", query);
        for hit in &hits {
            output.push_str(&format!(
                "\n- {} ({})\n  {}",
                hit.title,
                self.article_url(&hit.title),
                strip_html(&hit.snippet)
            ));
        }

        Ok(ToolResult::success(names::WIKI_ARTICLES, output))
    }
}
