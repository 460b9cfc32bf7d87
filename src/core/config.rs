//! Configuration management for Rihla
//!
//! Supports environment variables, config files, and runtime overrides.
//! API credentials never live in the config file; they are read from the
//! environment (or a `.env` file) into [`Credentials`].
//!
//! Config file location: ~/.config/rihla/config.toml

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::error::{Result, RihlaError};

/// Main configuration for Rihla
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM endpoint configuration
    pub llm: LlmConfig,
    /// Model references per agent family
    pub models: ModelConfig,
    /// Agent loop behavior
    pub agent: AgentConfig,
    /// Tool API settings
    pub tools: ToolsConfig,
    /// Image reference normalization
    pub images: ImageConfig,
    /// Orchestration flow
    pub flow: FlowConfig,
    /// Report language and layout
    pub report: ReportConfig,
    /// Document export
    pub export: ExportConfig,
}

/// OpenAI-compatible chat completion endpoint (Groq by default)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature for research agents
    pub temperature: f32,
    /// Completion token cap
    pub max_tokens: u32,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model for the research and travel agents
    pub research: String,
    /// Model for the report writer
    pub report: String,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum reasoning loop turns before the agent must answer
    /// Default: 6
    pub max_turns: usize,
}

/// Which image search backend the research agents get
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageProvider {
    /// Pexels stock photos (needs PEXELS_API_KEY)
    Pexels,
    /// Wikimedia file search (no key)
    Wikipedia,
}

/// Tool API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub image_provider: ImageProvider,
    /// Results requested per image search
    pub images_per_query: u32,
    /// Flight offers requested per search
    pub max_flight_offers: u32,
    /// Forecast horizon in days
    pub forecast_days: u32,
    /// Organic results kept per web search
    pub search_results: u32,
    pub serper_url: String,
    pub amadeus_url: String,
    pub weather_url: String,
    pub pexels_url: String,
    pub wikipedia_url: String,
    /// Timeout for tool HTTP calls in seconds
    pub timeout_secs: u64,
}

/// How image URLs without a known extension are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStrategy {
    /// Only fix up missing schemes
    SchemeOnly,
    /// Check reachability and content type over the network
    Probe,
    /// Append `.jpg` without any network access
    SuffixGuess,
}

/// What happens to a reference whose probe fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeFailurePolicy {
    /// Remove the reference
    Drop,
    /// Replace the reference with its bold caption
    Caption,
}

/// Image reference normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub strategy: ImageStrategy,
    pub on_probe_failure: ProbeFailurePolicy,
    pub probe_timeout_secs: u64,
}

/// Orchestration flow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Run the four research sections concurrently
    pub parallel: bool,
    /// Upper bound for one research section
    pub section_timeout_secs: u64,
}

/// Text direction of exported documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Rtl,
    Ltr,
}

/// Report language and layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Language every report must be written in
    pub language: String,
    /// BCP 47 tag used in exported HTML
    pub lang_tag: String,
    pub direction: TextDirection,
}

/// Document export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
    Html,
    Pdf,
}

/// Document export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Formats written after a successful run
    pub formats: Vec<ExportFormat>,
    /// Directory for exported files
    pub output_dir: PathBuf,
    /// File name prefix, followed by the destination
    pub file_prefix: String,
    /// External HTML-to-PDF renderer, invoked as `<cmd> <input.html> <output.pdf>`
    pub pdf_command: String,
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("RIHLA_LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
            timeout_secs: 120,
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            research: env::var("RIHLA_RESEARCH_MODEL")
                .unwrap_or_else(|_| "meta-llama/llama-4-scout-17b-16e-instruct".to_string()),
            report: env::var("RIHLA_REPORT_MODEL")
                .unwrap_or_else(|_| "meta-llama/llama-4-maverick-17b-128e-instruct".to_string()),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_turns: 6 }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            image_provider: env::var("RIHLA_IMAGE_PROVIDER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(ImageProvider::Pexels),
            images_per_query: 6,
            max_flight_offers: 3,
            forecast_days: 10,
            search_results: 8,
            serper_url: "https://google.serper.dev".to_string(),
            amadeus_url: "https://test.api.amadeus.com".to_string(),
            weather_url: "https://api.weatherapi.com".to_string(),
            pexels_url: "https://api.pexels.com".to_string(),
            wikipedia_url: "https://en.wikipedia.org".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            strategy: env::var("RIHLA_IMAGE_STRATEGY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(ImageStrategy::Probe),
            on_probe_failure: ProbeFailurePolicy::Drop,
            probe_timeout_secs: 5,
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            parallel: env_flag("RIHLA_PARALLEL", true),
            section_timeout_secs: 300,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            language: env::var("RIHLA_LANGUAGE").unwrap_or_else(|_| "Arabic".to_string()),
            lang_tag: "ar".to_string(),
            direction: TextDirection::Rtl,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            formats: vec![ExportFormat::Markdown, ExportFormat::Pdf],
            output_dir: PathBuf::from("."),
            file_prefix: "travel_plan".to_string(),
            pdf_command: env::var("RIHLA_PDF_COMMAND").unwrap_or_else(|_| "weasyprint".to_string()),
        }
    }
}

impl FromStr for ImageStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "scheme_only" | "none" => Ok(Self::SchemeOnly),
            "probe" => Ok(Self::Probe),
            "suffix_guess" | "suffix" => Ok(Self::SuffixGuess),
            other => Err(format!(
                "unknown image strategy '{}' (expected scheme_only, probe or suffix_guess)",
                other
            )),
        }
    }
}

impl FromStr for ImageProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pexels" => Ok(Self::Pexels),
            "wikipedia" | "wiki" => Ok(Self::Wikipedia),
            other => Err(format!(
                "unknown image provider '{}' (expected pexels or wikipedia)",
                other
            )),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!(
                "unknown export format '{}' (expected markdown, html or pdf)",
                other
            )),
        }
    }
}

impl ExportFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rihla")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(RihlaError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| RihlaError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text; missing keys take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RihlaError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file and return the path
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| RihlaError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| RihlaError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| RihlaError::config(format!("Failed to write config: {}", e)))?;

        Ok(config_path)
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

/// A credential the system may need
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Credential {
    Groq,
    Serper,
    AmadeusKey,
    AmadeusSecret,
    Weather,
    Pexels,
}

impl Credential {
    pub const ALL: [Credential; 6] = [
        Credential::Groq,
        Credential::Serper,
        Credential::AmadeusKey,
        Credential::AmadeusSecret,
        Credential::Weather,
        Credential::Pexels,
    ];

    /// Environment variable holding this credential
    pub fn env_var(&self) -> &'static str {
        match self {
            Credential::Groq => "GROQ_API_KEY",
            Credential::Serper => "SERPER_API_KEY",
            Credential::AmadeusKey => "AMADEUS_API_KEY",
            Credential::AmadeusSecret => "AMADEUS_API_SECRET",
            Credential::Weather => "WEATHER_API_KEY",
            Credential::Pexels => "PEXELS_API_KEY",
        }
    }
}

/// API credentials read from the environment
#[derive(Default)]
pub struct Credentials {
    secrets: HashMap<Credential, SecretString>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut present: Vec<&str> = self.secrets.keys().map(|c| c.env_var()).collect();
        present.sort_unstable();
        f.debug_struct("Credentials").field("present", &present).finish()
    }
}

impl Credentials {
    /// Read every known credential from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup; blank values count as absent
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secrets = Credential::ALL
            .iter()
            .filter_map(|cred| {
                lookup(cred.env_var())
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (*cred, SecretString::from(v)))
            })
            .collect();
        Self { secrets }
    }

    /// Whether a credential is present
    pub fn has(&self, cred: Credential) -> bool {
        self.secrets.contains_key(&cred)
    }

    /// Get an owned copy of a credential
    pub fn get(&self, cred: Credential) -> Option<SecretString> {
        self.secrets
            .get(&cred)
            .map(|s| SecretString::from(s.expose_secret().to_string()))
    }

    /// Get a credential or fail with a configuration error
    pub fn require(&self, cred: Credential) -> Result<SecretString> {
        self.get(cred)
            .ok_or_else(|| RihlaError::MissingCredentials(vec![cred.env_var().to_string()]))
    }

    /// Check that every listed credential is present
    pub fn ensure(&self, required: &[Credential]) -> Result<()> {
        let mut missing: Vec<String> = required
            .iter()
            .filter(|c| !self.has(**c))
            .map(|c| c.env_var().to_string())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        missing.dedup();
        Err(RihlaError::MissingCredentials(missing))
    }
}
