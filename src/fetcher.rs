use crate::types::{FetchConfig, PipelineError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const NEWS_SEARCH_BASE: &str = "https://news.google.com/rss/search";

/// Source of headline digests, one call per topic.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    /// Fetch the newline-joined headline digest for `topic`.
    ///
    /// A digest may legitimately be empty: a malformed or blocked feed is a
    /// degraded result, not a failure.
    async fn fetch(&self, topic: &str) -> Result<String>;
}

/// Fetches topic headlines from the Google News RSS search feed.
pub struct HeadlineFetcher {
    client: reqwest::Client,
}

impl HeadlineFetcher {
    pub fn new(config: FetchConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Deterministic per-topic query URL. Topics are trusted caller input;
    /// only URL-safe substitution is applied.
    pub fn query_url(topic: &str) -> Result<Url> {
        let mut url = Url::parse(NEWS_SEARCH_BASE)?;
        url.query_pairs_mut()
            .append_pair("q", topic)
            .append_pair("hl", "en-US")
            .append_pair("gl", "US")
            .append_pair("ceid", "US:en");
        Ok(url)
    }
}

#[async_trait]
impl HeadlineSource for HeadlineFetcher {
    async fn fetch(&self, topic: &str) -> Result<String> {
        let url = Self::query_url(topic)?;
        debug!("fetching headlines for '{}' from {}", topic, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::Fetch(e.to_string()))?;

        // The body is parsed regardless of status: a blocked request tends
        // to come back as an HTML page, which degrades to zero headlines
        // below rather than failing the topic.
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::Fetch(e.to_string()))?;

        Ok(digest_from_feed(topic, &body))
    }
}

/// Extract a newline-joined headline digest from a syndication feed body.
///
/// Headlines keep feed order; nothing is deduplicated or truncated. Content
/// that does not parse as a feed yields an empty digest.
pub fn digest_from_feed(topic: &str, content: &str) -> String {
    match feed_rs::parser::parse(content.as_bytes()) {
        Ok(feed) => {
            let headlines: Vec<String> = feed
                .entries
                .into_iter()
                .filter_map(|entry| entry.title.map(|title| title.content))
                .collect();
            debug!("parsed {} headlines for '{}'", headlines.len(), topic);
            headlines.join("\n")
        }
        Err(e) => {
            warn!(
                "failed to parse feed for '{}', treating as zero headlines: {}",
                topic, e
            );
            String::new()
        }
    }
}

/// Deterministic in-memory source for tests and offline development.
#[derive(Default)]
pub struct MockHeadlineSource {
    digests: HashMap<String, String>,
    failing: HashSet<String>,
    calls: AtomicU32,
}

impl MockHeadlineSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_digest(mut self, topic: &str, headlines: &[&str]) -> Self {
        self.digests.insert(topic.to_string(), headlines.join("\n"));
        self
    }

    /// Every fetch for `topic` fails with a network-style error.
    pub fn with_failure(mut self, topic: &str) -> Self {
        self.failing.insert(topic.to_string());
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HeadlineSource for MockHeadlineSource {
    async fn fetch(&self, topic: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if self.failing.contains(topic) {
            return Err(PipelineError::Fetch(format!(
                "connection refused fetching '{}'",
                topic
            )));
        }

        Ok(self.digests.get(topic).cloned().unwrap_or_default())
    }
}
