//! Shared HTTP plumbing for tool clients

use reqwest::{Client, Response};
use std::time::Duration;

use crate::core::{Result, RihlaError};

/// Build a client with the tool timeout
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("rihla/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| RihlaError::config(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success answer into a provider error carrying the status
pub(crate) async fn check_status(service: &str, response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(RihlaError::provider_status(service, status, truncate(&body, 300)))
}

/// Cut text to at most `max` characters on a char boundary
pub(crate) fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
