//! Error types for Rihla
//!
//! Every failure carries a structured [`ErrorKind`] so callers can tell
//! configuration problems from upstream outages, bad input, or export failures.

use thiserror::Error;

/// Broad classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing credentials or an unusable config file. Fatal at startup.
    Configuration,
    /// An LLM or tool API call failed
    Upstream,
    /// Input that does not satisfy a data-model invariant
    Validation,
    /// Markdown/HTML/PDF export failed
    Rendering,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Upstream => write!(f, "upstream"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Rendering => write!(f, "rendering"),
        }
    }
}

/// Main error type for Rihla operations
#[derive(Error, Debug)]
pub enum RihlaError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required credentials absent from the environment
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    /// An external service answered with an error or an unusable payload
    #[error("{service} error: {message}")]
    Provider {
        service: String,
        message: String,
        /// HTTP status, when the service answered at all
        status: Option<u16>,
    },

    /// A bounded operation ran out of time
    #[error("{what} timed out after {secs}s")]
    Timeout { what: String, secs: u64 },

    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Export failures
    #[error("Render error: {0}")]
    Render(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<RihlaError>,
    },
}

/// Convenience Result type for Rihla operations
pub type Result<T> = std::result::Result<T, RihlaError>;

impl RihlaError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider error without a status code
    pub fn provider(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            service: service.into(),
            message: msg.into(),
            status: None,
        }
    }

    /// Create a provider error from a non-success HTTP answer
    pub fn provider_status(service: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Provider {
            service: service.into(),
            message: format!("HTTP {}: {}", status, body.into()),
            status: Some(status),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a render error
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Wrap an error with additional context, keeping its kind
    pub fn with_context(context: impl Into<String>, error: RihlaError) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Structured classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::MissingCredentials(_) => ErrorKind::Configuration,
            Self::Provider { .. } | Self::Timeout { .. } | Self::Http(_) | Self::Json(_) => {
                ErrorKind::Upstream
            }
            Self::Validation(_) => ErrorKind::Validation,
            Self::Render(_) | Self::Io(_) => ErrorKind::Rendering,
            Self::WithContext { source, .. } => source.kind(),
        }
    }

    /// Whether retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Provider {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::WithContext { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
