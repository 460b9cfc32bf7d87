//! Tools module - external API tools for the agents
//!
//! Contains the tool registry and one client per travel data source.

pub mod flights;
mod http;
pub mod images;
pub mod registry;
pub mod search;
pub mod weather;
pub mod wiki;

pub use registry::{names, Tool, ToolRegistry};
