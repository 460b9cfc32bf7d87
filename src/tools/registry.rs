//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for registering tools and routing tool calls to handlers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{
    Config, Credential, Credentials, Result, ToolCall, ToolCategory, ToolDefinition, ToolResult,
};
use crate::core::config::ImageProvider;
use crate::render::probe::{HttpImageProbe, ImageProbe};
use crate::tools::flights::FlightSearchTool;
use crate::tools::images::{PexelsImagesTool, WikiImagesTool};
use crate::tools::search::WebSearchTool;
use crate::tools::weather::WeatherTool;
use crate::tools::wiki::WikiArticlesTool;

/// Names under which the built-in tools are registered
pub mod names {
    pub const WEB_SEARCH: &str = "web_search";
    pub const WIKI_ARTICLES: &str = "wiki_articles";
    pub const SEARCH_IMAGES: &str = "search_images";
    pub const SEARCH_FLIGHTS: &str = "search_flights";
    pub const WEATHER_FORECAST: &str = "weather_forecast";
}

/// A callable tool exposed to agents
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function definition sent to the model
    fn definition(&self) -> ToolDefinition;

    /// Category of the tool
    fn category(&self) -> ToolCategory;

    /// Run the tool for one call
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    /// Tools indexed by name
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Credentials the built-in tool with this name needs
    pub fn required_credentials(tool: &str, config: &Config) -> Vec<Credential> {
        match tool {
            names::WEB_SEARCH => vec![Credential::Serper],
            names::SEARCH_FLIGHTS => vec![Credential::AmadeusKey, Credential::AmadeusSecret],
            names::WEATHER_FORECAST => vec![Credential::Weather],
            names::SEARCH_IMAGES if config.tools.image_provider == ImageProvider::Pexels => {
                vec![Credential::Pexels]
            }
            _ => Vec::new(),
        }
    }

    /// Register the built-in tools named in `wanted`
    ///
    /// Credentials must already have been checked; a missing one is reported
    /// as a configuration error.
    pub fn from_config(config: &Config, credentials: &Credentials, wanted: &[&str]) -> Result<Self> {
        let mut registry = Self::new();

        for name in wanted {
            if registry.contains(name) {
                continue;
            }

            match *name {
                names::WEB_SEARCH => registry.register(Arc::new(WebSearchTool::from_config(
                    config,
                    credentials.require(Credential::Serper)?,
                )?)),
                names::WIKI_ARTICLES => {
                    registry.register(Arc::new(WikiArticlesTool::from_config(config)?))
                }
                names::SEARCH_IMAGES => match config.tools.image_provider {
                    ImageProvider::Pexels => {
                        let probe: Arc<dyn ImageProbe> =
                            Arc::new(HttpImageProbe::from_config(config)?);
                        registry.register(Arc::new(PexelsImagesTool::from_config(
                            config,
                            credentials.require(Credential::Pexels)?,
                            probe,
                        )?))
                    }
                    ImageProvider::Wikipedia => {
                        registry.register(Arc::new(WikiImagesTool::from_config(config)?))
                    }
                },
                names::SEARCH_FLIGHTS => registry.register(Arc::new(FlightSearchTool::from_config(
                    config,
                    credentials.require(Credential::AmadeusKey)?,
                    credentials.require(Credential::AmadeusSecret)?,
                )?)),
                names::WEATHER_FORECAST => registry.register(Arc::new(WeatherTool::from_config(
                    config,
                    credentials.require(Credential::Weather)?,
                )?)),
                other => {
                    return Err(crate::core::RihlaError::config(format!(
                        "unknown tool '{}'",
                        other
                    )))
                }
            }
        }

        tracing::debug!(tools = ?registry.names(), "Tool registry ready");
        Ok(registry)
    }

    /// Register a tool under its definition name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().function.name;
        self.tools.insert(name, tool);
    }

    /// Whether a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Definitions for the given tool names, in the given order; unknown names are skipped
    pub fn definitions_for(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    /// Get tool definitions by category
    pub fn definitions_by_category(&self, category: ToolCategory) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .filter(|tool| tool.category() == category)
            .map(|tool| tool.definition())
            .collect();
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    /// Execute a tool call
    pub async fn execute(&self, tool_call: &ToolCall) -> Result<ToolResult> {
        match self.tools.get(&tool_call.name) {
            Some(tool) => {
                tracing::info!(tool = %tool_call.name, "Executing tool");
                tool.execute(tool_call).await
            }
            None => Ok(ToolResult::failure(
                &tool_call.name,
                format!("Unknown tool: {}", tool_call.name),
            )),
        }
    }
}
