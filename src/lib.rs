//! Rihla - agent-driven travel planner
//!
//! Researches a trip with LLM agents and external travel APIs, merges the
//! findings into one travel report and exports it as Markdown, HTML or PDF.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, credentials and errors
//! - **LLM**: Provider trait with a Groq (OpenAI-compatible) client
//! - **Tools**: Web search, encyclopedia, images, flights and weather
//! - **Agent**: Agent profiles and the tool loop that runs them
//! - **Research**: Task prompts and the planning flow
//! - **Render**: Image link normalization, terminal output and export
//! - **CLI**: Command-line interface and the interactive trip form
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rihla::{Config, Credentials, GroqClient, PlanningFlow, TripRequest};
//!
//! #[tokio::main]
//! async fn main() -> rihla::Result<()> {
//!     let config = Config::load();
//!     let credentials = Credentials::from_env();
//!     let llm = Arc::new(GroqClient::from_config(&config, &credentials)?);
//!     let mut flow = PlanningFlow::from_config(&config, &credentials, llm)?;
//!
//!     let dates = TripRequest::parse_dates(&["2025-06-01"])?;
//!     let trip = TripRequest::new("Cairo", "Paris", dates, "museums")?;
//!     let outcome = flow.run(trip).await?;
//!     println!("{}", rihla::render::present::render_outcome(&outcome));
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod render;
pub mod research;
pub mod tools;

// Re-export commonly used items
pub use agent::{AgentRegistry, AgentRunner};
pub use core::{Config, Credentials, Result, RihlaError, TripRequest};
pub use llm::GroqClient;
pub use research::{PlanOutcome, PlanningFlow};
