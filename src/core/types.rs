//! Shared types used across Rihla modules
//!
//! Contains message structures, tool definitions, and the trip data model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, RihlaError};

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// A tool call made by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments,
        }
    }

    /// Get a string argument by key
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Get an unsigned integer argument by key; numeric strings are accepted
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        let value = self.arguments.get(key)?;
        value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
    }

    /// Get a required string argument
    pub fn require_string(&self, key: &str) -> Result<String> {
        self.get_string(key).ok_or_else(|| {
            RihlaError::validation(format!("tool '{}' needs argument '{}'", self.name, key))
        })
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details
    pub function: FunctionDefinition,
}

/// Function definition within a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new function tool definition
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    /// Name of the function
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Result of executing a tool
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Output from the tool
    pub output: String,
    /// Optional structured data
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            output: output.into(),
            data: None,
        }
    }

    /// Create a successful result with structured data
    pub fn success_with_data(
        tool_name: impl Into<String>,
        output: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            output: output.into(),
            data: Some(data),
        }
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            output: error.into(),
            data: None,
        }
    }
}

/// Category of tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Web and encyclopedia search
    Search,
    /// Stock or encyclopedia images
    Images,
    /// Flight offers
    Flights,
    /// Weather forecasts
    Weather,
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolCategory::Search => write!(f, "search"),
            ToolCategory::Images => write!(f, "images"),
            ToolCategory::Flights => write!(f, "flights"),
            ToolCategory::Weather => write!(f, "weather"),
        }
    }
}

/// The parameters of one planning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRequest {
    origin: String,
    destination: String,
    travel_dates: Vec<NaiveDate>,
    interests: String,
}

impl TripRequest {
    /// Validate and build a trip request; dates are sorted and deduplicated
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        mut travel_dates: Vec<NaiveDate>,
        interests: impl Into<String>,
    ) -> Result<Self> {
        let origin = origin.into().trim().to_string();
        let destination = destination.into().trim().to_string();

        if origin.is_empty() {
            return Err(RihlaError::validation("departure city is required"));
        }
        if destination.is_empty() {
            return Err(RihlaError::validation("destination city is required"));
        }
        if travel_dates.is_empty() {
            return Err(RihlaError::validation("at least one travel date is required"));
        }

        travel_dates.sort_unstable();
        travel_dates.dedup();

        Ok(Self {
            origin,
            destination,
            travel_dates,
            interests: interests.into().trim().to_string(),
        })
    }

    /// Parse ISO-8601 (`YYYY-MM-DD`) dates
    pub fn parse_dates<S: AsRef<str>>(raw: &[S]) -> Result<Vec<NaiveDate>> {
        raw.iter()
            .map(|s| {
                let s = s.as_ref().trim();
                NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
                    RihlaError::validation(format!("invalid date '{}': {} (expected YYYY-MM-DD)", s, e))
                })
            })
            .collect()
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn travel_dates(&self) -> &[NaiveDate] {
        &self.travel_dates
    }

    pub fn interests(&self) -> &str {
        &self.interests
    }

    /// Dates rendered as `YYYY-MM-DD, YYYY-MM-DD`
    pub fn dates_label(&self) -> String {
        self.travel_dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The four independent research concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    Destination,
    Events,
    Weather,
    Flights,
}

impl SectionKey {
    /// Canonical presentation order
    pub const ALL: [SectionKey; 4] = [
        SectionKey::Destination,
        SectionKey::Events,
        SectionKey::Weather,
        SectionKey::Flights,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::Destination => "destination",
            SectionKey::Events => "events",
            SectionKey::Weather => "weather",
            SectionKey::Flights => "flights",
        }
    }

    /// Heading shown above the section
    pub fn title(&self) -> &'static str {
        match self {
            SectionKey::Destination => "📍 Destination",
            SectionKey::Events => "🎯 Events & Activities",
            SectionKey::Weather => "☀️ Weather Forecast",
            SectionKey::Flights => "✈️ Flight Options",
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One section's Markdown output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResearchReport {
    pub section: SectionKey,
    pub body: String,
}

/// The merged travel report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalReport {
    /// Destination the report covers, used for export naming
    pub destination: String,
    pub body: String,
}
