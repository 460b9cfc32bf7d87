//! Image reachability probe
//!
//! A URL counts as an image when it answers 200 with an `image/*` content type.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::core::{Config, Result, RihlaError};

/// Decides whether a URL points at a reachable image
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn is_image(&self, url: &str) -> bool;
}

/// Probe over HTTP: HEAD first, GET when the server refuses HEAD
pub struct HttpImageProbe {
    client: Client,
}

impl HttpImageProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| RihlaError::config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(Duration::from_secs(config.images.probe_timeout_secs))
    }

    fn accepts(status: StatusCode, content_type: Option<&str>) -> bool {
        status == StatusCode::OK
            && content_type
                .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
                .unwrap_or(false)
    }

    async fn check(&self, url: &str) -> std::result::Result<bool, reqwest::Error> {
        let mut response = self.client.head(url).send().await?;

        if matches!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
        ) {
            response = self.client.get(url).send().await?;
        }

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());

        tracing::debug!(url, %status, content_type, "Probed image URL");
        Ok(Self::accepts(status, content_type))
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn is_image(&self, url: &str) -> bool {
        match self.check(url).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(url, "URL is not a reachable image");
                false
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Image URL check failed");
                false
            }
        }
    }
}
