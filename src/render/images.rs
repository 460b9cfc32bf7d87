//! Image reference normalization
//!
//! Rewrites every `![caption](url)` in a Markdown document so the URL is
//! absolute (`http://` or `https://`). URLs without a known image extension
//! are then handled by the configured [`ImageStrategy`]: left alone, probed
//! over the network, or given a `.jpg` suffix.
//!
//! URLs may contain one level of balanced parentheses, as Wikimedia file
//! names often do. Inline code spans and fenced code blocks are copied
//! through untouched.

use futures::future::join_all;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::core::config::{ImageStrategy, ProbeFailurePolicy};
use crate::core::{Config, Result};
use crate::render::probe::{HttpImageProbe, ImageProbe};

/// Extensions accepted without further checks
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Suffix appended by the suffix-guess strategy
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Matches a code span or fence (group `code`) or an image reference
/// (groups `caption` and `url`)
fn image_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r"(?s)(?P<code>```.*?(?:```|\z)|`[^`\n]*`)",
            r"|!\[(?P<caption>[^\]]*)\]\(\s*(?P<url>(?:[^()\s]|\([^()\s]*\))*)\s*\)",
        ))
        .expect("valid image regex")
    })
}

/// Make a URL absolute: `//host` gets `https:`, a bare host gets `https://`
pub fn fix_scheme(url: &str) -> String {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();

    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        format!("https://{}", url)
    }
}

/// Byte offset where the query string or fragment starts, or the length
fn path_end(url: &str) -> usize {
    url.find(['?', '#']).unwrap_or(url.len())
}

/// Whether the URL path ends in a known image extension (query and fragment ignored)
pub fn has_image_extension(url: &str) -> bool {
    let path = url[..path_end(url)].to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(&format!(".{}", ext)))
}

/// Append [`DEFAULT_EXTENSION`] to the URL path, before any query or fragment
pub fn append_default_extension(url: &str) -> String {
    let end = path_end(url);
    format!("{}{}{}", &url[..end], DEFAULT_EXTENSION, &url[end..])
}

/// Outcome of one normalization pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMarkdown {
    pub text: String,
    /// References whose URL changed
    pub rewritten: usize,
    /// References removed or replaced by their caption
    pub dropped: usize,
}

#[derive(Clone)]
enum Mode {
    SchemeOnly,
    Probe {
        probe: Arc<dyn ImageProbe>,
        on_failure: ProbeFailurePolicy,
    },
    SuffixGuess,
}

/// Rewrites image references according to a strategy
#[derive(Clone)]
pub struct ImageNormalizer {
    mode: Mode,
}

impl std::fmt::Debug for ImageNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageNormalizer")
            .field("strategy", &self.strategy())
            .finish()
    }
}

/// What happens to one reference
enum Action {
    Keep(String),
    Caption,
    Remove,
}

impl ImageNormalizer {
    /// Fix schemes only
    pub fn scheme_only() -> Self {
        Self {
            mode: Mode::SchemeOnly,
        }
    }

    /// Probe URLs lacking an image extension
    pub fn probing(probe: Arc<dyn ImageProbe>, on_failure: ProbeFailurePolicy) -> Self {
        Self {
            mode: Mode::Probe { probe, on_failure },
        }
    }

    /// Append `.jpg` to URLs lacking an image extension
    pub fn suffix_guess() -> Self {
        Self {
            mode: Mode::SuffixGuess,
        }
    }

    /// Build the normalizer selected by `images.strategy`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(match config.images.strategy {
            ImageStrategy::SchemeOnly => Self::scheme_only(),
            ImageStrategy::SuffixGuess => Self::suffix_guess(),
            ImageStrategy::Probe => Self::probing(
                Arc::new(HttpImageProbe::from_config(config)?),
                config.images.on_probe_failure,
            ),
        })
    }

    pub fn strategy(&self) -> ImageStrategy {
        match self.mode {
            Mode::SchemeOnly => ImageStrategy::SchemeOnly,
            Mode::Probe { .. } => ImageStrategy::Probe,
            Mode::SuffixGuess => ImageStrategy::SuffixGuess,
        }
    }

    /// Normalize every image reference in `markdown`
    ///
    /// Failed probes are logged and resolved per the failure policy; this
    /// never fails as a whole.
    pub async fn normalize(&self, markdown: &str) -> NormalizedMarkdown {
        let pattern = image_pattern();

        let fixed: Vec<String> = pattern
            .captures_iter(markdown)
            .filter_map(|caps| caps.name("url").map(|url| fix_scheme(url.as_str())))
            .collect();

        let probed = match &self.mode {
            Mode::Probe { probe, .. } => Self::probe_all(probe.as_ref(), &fixed).await,
            _ => HashMap::new(),
        };

        let mut rewritten = 0;
        let mut dropped = 0;
        let mut index = 0;

        let text = pattern.replace_all(markdown, |caps: &Captures| {
            let original = match caps.name("url") {
                Some(url) => url.as_str(),
                None => return caps[0].to_string(),
            };
            let caption = &caps["caption"];
            let url = &fixed[index];
            index += 1;

            match self.decide(original, url, &probed) {
                Action::Keep(new_url) => {
                    if new_url != original {
                        rewritten += 1;
                    }
                    format!("![{}]({})", caption, new_url)
                }
                Action::Caption => {
                    dropped += 1;
                    format!("**{}**", caption)
                }
                Action::Remove => {
                    dropped += 1;
                    String::new()
                }
            }
        });

        if rewritten > 0 || dropped > 0 {
            tracing::debug!(rewritten, dropped, strategy = ?self.strategy(), "Normalized image references");
        }

        NormalizedMarkdown {
            text: text.into_owned(),
            rewritten,
            dropped,
        }
    }

    fn decide(&self, original: &str, url: &str, probed: &HashMap<String, bool>) -> Action {
        if original.is_empty() {
            tracing::warn!("Dropping image reference without a URL");
            return Action::Remove;
        }

        if has_image_extension(url) {
            return Action::Keep(url.to_string());
        }

        match &self.mode {
            Mode::SchemeOnly => Action::Keep(url.to_string()),
            Mode::SuffixGuess => Action::Keep(append_default_extension(url)),
            Mode::Probe { on_failure, .. } => {
                if probed.get(url).copied().unwrap_or(false) {
                    Action::Keep(url.to_string())
                } else {
                    tracing::warn!(url, "Image failed validation");
                    match on_failure {
                        ProbeFailurePolicy::Drop => Action::Remove,
                        ProbeFailurePolicy::Caption => Action::Caption,
                    }
                }
            }
        }
    }

    /// Probe each distinct URL that lacks an image extension, concurrently
    async fn probe_all(probe: &dyn ImageProbe, urls: &[String]) -> HashMap<String, bool> {
        let mut pending: Vec<&str> = urls
            .iter()
            .map(String::as_str)
            .filter(|url| *url != "https://" && !has_image_extension(url))
            .collect();
        pending.sort_unstable();
        pending.dedup();

        let results = join_all(pending.iter().map(|url| probe.is_image(url))).await;
        pending
            .into_iter()
            .map(str::to_string)
            .zip(results)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Accepts URLs containing "ok" and counts calls
    #[derive(Default)]
    struct FakeProbe {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageProbe for FakeProbe {
        async fn is_image(&self, url: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            url.contains("ok")
        }
    }

    #[tokio::test]
    async fn test_protocol_relative_gets_https() {
        let input = "Intro\n\n![x](//host/path.png)\n\nOutro";
        let out = ImageNormalizer::scheme_only().normalize(input).await;
        assert_eq!(out.text, "Intro\n\n![x](https://host/path.png)\n\nOutro");
        assert_eq!(out.rewritten, 1);
    }

    #[tokio::test]
    async fn test_bare_host_gets_https() {
        let out = ImageNormalizer::suffix_guess()
            .normalize("![x](host/path.png)")
            .await;
        assert_eq!(out.text, "![x](https://host/path.png)");
    }

    #[tokio::test]
    async fn test_absolute_urls_untouched() {
        let input = "![a](http://example.com/a.jpg) and ![b](https://example.com/b.webp?w=200)";
        let probe = Arc::new(FakeProbe::default());
        let out = ImageNormalizer::probing(probe.clone(), ProbeFailurePolicy::Drop)
            .normalize(input)
            .await;
        assert_eq!(out.text, input);
        assert_eq!(out.rewritten, 0);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_probe_drops_failures() {
        let input = "A ![good](https://cdn/ok-photo) B ![bad](https://cdn/nope) C";
        let out = ImageNormalizer::probing(Arc::new(FakeProbe::default()), ProbeFailurePolicy::Drop)
            .normalize(input)
            .await;
        assert_eq!(out.text, "A ![good](https://cdn/ok-photo) B  C");
        assert_eq!(out.dropped, 1);
    }

    #[tokio::test]
    async fn test_probe_caption_fallback() {
        let out = ImageNormalizer::probing(Arc::new(FakeProbe::default()), ProbeFailurePolicy::Caption)
            .normalize("![Eiffel Tower](cdn/nope)")
            .await;
        assert_eq!(out.text, "**Eiffel Tower**");
    }

    #[tokio::test]
    async fn test_probe_each_url_once() {
        let probe = Arc::new(FakeProbe::default());
        let input = "![a](//cdn/ok) ![b](https://cdn/ok) ![c](cdn/ok)";
        let out = ImageNormalizer::probing(probe.clone(), ProbeFailurePolicy::Drop)
            .normalize(input)
            .await;
        assert_eq!(
            out.text,
            "![a](https://cdn/ok) ![b](https://cdn/ok) ![c](https://cdn/ok)"
        );
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_suffix_guess_appends_jpg() {
        let out = ImageNormalizer::suffix_guess()
            .normalize("![x](https://host/photo) ![y](https://host/p?size=large)")
            .await;
        assert_eq!(
            out.text,
            "![x](https://host/photo.jpg) ![y](https://host/p.jpg?size=large)"
        );
        assert_eq!(out.rewritten, 2);
    }

    #[tokio::test]
    async fn test_empty_url_dropped() {
        let out = ImageNormalizer::scheme_only().normalize("before ![x]() after").await;
        assert_eq!(out.text, "before  after");
        assert_eq!(out.dropped, 1);
    }

    #[tokio::test]
    async fn test_text_without_images_unchanged() {
        let input = "# Paris\n\n[a link](louvre.fr) and `![code]`";
        let out = ImageNormalizer::suffix_guess().normalize(input).await;
        assert_eq!(out.text, input);
    }

    #[test]
    fn test_extension_detection() {
        assert!(has_image_extension("https://a/b.JPG"));
        assert!(has_image_extension("https://a/b.jpeg?auto=compress#top"));
        assert!(!has_image_extension("https://a/b.jpg.html"));
        assert!(!has_image_extension("https://a/photo"));
    }

    const LOUVRE: &str =
        "![Louvre](https://upload.wikimedia.org/wikipedia/commons/a/ab/Louvre_(Paris).jpg)";

    #[tokio::test]
    async fn test_parenthesized_url_untouched_by_every_strategy() {
        let input = format!("See {} (left bank).", LOUVRE);
        let probe = Arc::new(FakeProbe::default());
        for normalizer in [
            ImageNormalizer::scheme_only(),
            ImageNormalizer::suffix_guess(),
            ImageNormalizer::probing(probe.clone(), ProbeFailurePolicy::Drop),
        ] {
            let out = normalizer.normalize(&input).await;
            assert_eq!(out.text, input, "{:?}", normalizer.strategy());
            assert_eq!(out.rewritten + out.dropped, 0);
        }
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_parenthesized_url_gets_scheme_and_suffix() {
        let out = ImageNormalizer::suffix_guess()
            .normalize("(![Nile](//commons.example/Nile_(river)))")
            .await;
        assert_eq!(out.text, "(![Nile](https://commons.example/Nile_(river).jpg))");
    }

    #[tokio::test]
    async fn test_padded_url_trimmed() {
        let out = ImageNormalizer::scheme_only()
            .normalize("![two]( //b/c.gif )")
            .await;
        assert_eq!(out.text, "![two](https://b/c.gif)");
    }

    #[tokio::test]
    async fn test_code_left_alone() {
        let input = "Use `![x](host/a)` like this:\n\n```md\n![y](host/b)\n```\n\n![z](host/c)";
        let out = ImageNormalizer::suffix_guess().normalize(input).await;
        assert_eq!(
            out.text,
            "Use `![x](host/a)` like this:\n\n```md\n![y](host/b)\n```\n\n![z](https://host/c.jpg)"
        );
        assert_eq!(out.rewritten, 1);
    }

    #[test]
    fn test_from_config_selects_strategy() {
        let mut config = Config::default();
        config.images.strategy = ImageStrategy::SuffixGuess;
        assert_eq!(
            ImageNormalizer::from_config(&config).unwrap().strategy(),
            ImageStrategy::SuffixGuess
        );
    }
}
