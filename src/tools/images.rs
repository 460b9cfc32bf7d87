//! Image search tools
//!
//! Two interchangeable backends register under the same tool name: Pexels
//! stock photos (API key, query and result count) and Wikimedia file search
//! (no key). Both return ready-to-paste Markdown image references.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{Config, Result, ToolCall, ToolCategory, ToolDefinition, ToolResult};
use crate::render::probe::ImageProbe;
use crate::tools::http::{build_client, check_status};
use crate::tools::registry::{names, Tool};

/// A found image
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FoundImage {
    pub url: String,
    pub caption: String,
}

fn image_definition(description: &str) -> ToolDefinition {
    ToolDefinition::function(
        names::SEARCH_IMAGES,
        description,
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to find pictures of, always in English"
                }
            },
            "required": ["query"]
        }),
    )
}

fn format_images(query: &str, images: &[FoundImage]) -> ToolResult {
    if images.is_empty() {
        return ToolResult::success(
            names::SEARCH_IMAGES,
            format!("No valid images found for \"{}\".", query),
        );
    }

    let mut output = format!("Images for \"{}\" (use these exact URLs):\n", query);
    for image in images {
        output.push_str(&format!("\n![{}]({})", image.caption, image.url));
    }

    ToolResult::success_with_data(
        names::SEARCH_IMAGES,
        output,
        serde_json::to_value(images).unwrap_or(serde_json::Value::Null),
    )
}

/// Pexels stock photo search
pub struct PexelsImagesTool {
    client: Client,
    base_url: String,
    api_key: SecretString,
    per_page: u32,
    probe: Arc<dyn ImageProbe>,
}

#[derive(Debug, Deserialize)]
struct PexelsResponse {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    #[serde(default)]
    alt: String,
    #[serde(default)]
    photographer: String,
    src: HashMap<String, String>,
}

impl PexelsImagesTool {
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        per_page: u32,
        timeout: Duration,
        probe: Arc<dyn ImageProbe>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            per_page,
            probe,
        })
    }

    pub fn from_config(config: &Config, api_key: SecretString, probe: Arc<dyn ImageProbe>) -> Result<Self> {
        Self::new(
            &config.tools.pexels_url,
            api_key,
            config.tools.images_per_query,
            Duration::from_secs(config.tools.timeout_secs),
            probe,
        )
    }

    /// Search and keep only photos whose original URL probes as an image
    pub async fn search(&self, query: &str) -> Result<Vec<FoundImage>> {
        tracing::info!(query, "Searching images on Pexels");

        let response = self
            .client
            .get(format!("{}/v1/search", self.base_url))
            .header("Authorization", self.api_key.expose_secret())
            .query(&[("query", query.to_string()), ("per_page", self.per_page.to_string())])
            .send()
            .await?;
        let response = check_status("pexels", response).await?;
        let parsed: PexelsResponse = response.json().await?;

        let candidates: Vec<FoundImage> = parsed
            .photos
            .into_iter()
            .filter_map(|photo| {
                let url = photo.src.get("original")?.clone();
                let caption = if photo.alt.is_empty() {
                    format!("{} (photo: {})", query, photo.photographer)
                } else {
                    photo.alt
                };
                Some(FoundImage { url, caption })
            })
            .collect();

        let checks = join_all(candidates.iter().map(|c| self.probe.is_image(&c.url))).await;
        let valid: Vec<FoundImage> = candidates
            .into_iter()
            .zip(checks)
            .filter_map(|(image, ok)| {
                if !ok {
                    tracing::info!(url = %image.url, "Skipping image that failed validation");
                }
                ok.then_some(image)
            })
            .collect();

        if valid.is_empty() {
            tracing::warn!(query, "No valid images found");
        }
        Ok(valid)
    }
}

#[async_trait]
impl Tool for PexelsImagesTool {
    fn definition(&self) -> ToolDefinition {
        image_definition("Search high-quality stock photos for a place, landmark or event")
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Images
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let query = call.require_string("query")?;
        let images = self.search(&query).await?;
        Ok(format_images(&query, &images))
    }
}

/// Wikimedia file search
pub struct WikiImagesTool {
    client: Client,
    base_url: String,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct WikiImageResponse {
    query: Option<WikiPages>,
}

#[derive(Debug, Deserialize)]
struct WikiPages {
    #[serde(default)]
    pages: HashMap<String, WikiPage>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    title: String,
    #[serde(default)]
    index: u32,
    #[serde(default)]
    imageinfo: Vec<WikiImageInfo>,
}

#[derive(Debug, Deserialize)]
struct WikiImageInfo {
    url: String,
    #[serde(default)]
    mime: String,
}

impl WikiImagesTool {
    pub fn new(base_url: impl Into<String>, limit: u32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limit,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.tools.wikipedia_url,
            config.tools.images_per_query,
            Duration::from_secs(config.tools.timeout_secs),
        )
    }

    /// Turn a `File:Some_name.jpg` title into a caption
    fn caption_from_title(title: &str) -> String {
        let name = title.strip_prefix("File:").unwrap_or(title);
        let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
        stem.replace('_', " ")
    }

    pub async fn search(&self, query: &str) -> Result<Vec<FoundImage>> {
        tracing::info!(query, "Searching images on Wikipedia");

        let response = self
            .client
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query".to_string()),
                ("format", "json".to_string()),
                ("generator", "search".to_string()),
                ("gsrsearch", query.to_string()),
                ("gsrnamespace", "6".to_string()),
                ("gsrlimit", self.limit.to_string()),
                ("prop", "imageinfo".to_string()),
                ("iiprop", "url|mime".to_string()),
            ])
            .send()
            .await?;
        let response = check_status("wikipedia", response).await?;
        let parsed: WikiImageResponse = response.json().await?;

        let mut pages: Vec<WikiPage> = parsed
            .query
            .map(|q| q.pages.into_values().collect())
            .unwrap_or_default();
        pages.sort_by_key(|p| p.index);

        Ok(pages
            .into_iter()
            .filter_map(|page| {
                let info = page.imageinfo.into_iter().next()?;
                info.mime.starts_with("image/").then(|| FoundImage {
                    url: info.url,
                    caption: Self::caption_from_title(&page.title),
                })
            })
            .collect())
    }
}

#[async_trait]
impl Tool for WikiImagesTool {
    fn definition(&self) -> ToolDefinition {
        image_definition("Search Wikipedia / Wikimedia Commons images of a place or landmark")
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Images
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let query = call.require_string("query")?;
        let images = self.search(&query).await?;
        Ok(format_images(&query, &images))
    }
}
