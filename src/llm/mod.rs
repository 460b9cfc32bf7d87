//! LLM module - Language Model integrations
//!
//! Provides the provider abstraction and the Groq implementation.

pub mod groq;
pub mod traits;

pub use groq::GroqClient;
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
