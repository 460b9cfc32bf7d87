//! Core module - shared infrastructure for Rihla
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the application.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, Credential, Credentials};
pub use error::{ErrorKind, Result, RihlaError};
pub use types::*;
