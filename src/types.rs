use serde::{Deserialize, Serialize};

/// Outcome of one topic's fetch+summarize pipeline.
///
/// `Failed` carries the final error message after retries were exhausted.
/// Both variants are folded into plain script text before composition, so
/// the composer input stays homogeneous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum TopicResult {
    Summary(String),
    Failed(String),
}

impl TopicResult {
    /// Render the result the way it appears in the broadcast script input.
    pub fn as_script_text(&self) -> String {
        match self {
            TopicResult::Summary(text) => text.clone(),
            TopicResult::Failed(cause) => format!("Error: {}", cause),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TopicResult::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicEntry {
    pub topic: String,
    pub result: TopicResult,
}

/// Ordered topic → result mapping produced by the coordinator.
///
/// Entries are kept in request topic order; there is exactly one entry per
/// requested topic once a run completes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewsAnalysis {
    #[serde(rename = "news_analysis")]
    entries: Vec<TopicEntry>,
}

impl NewsAnalysis {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, topic: String, result: TopicResult) {
        self.entries.push(TopicEntry { topic, result });
    }

    pub fn get(&self, topic: &str) -> Option<&TopicResult> {
        self.entries
            .iter()
            .find(|entry| entry.topic == topic)
            .map(|entry| &entry.result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TopicResult)> {
        self.entries
            .iter()
            .map(|entry| (entry.topic.as_str(), &entry.result))
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            // Browser-like identification reduces the chance of the feed
            // host rejecting the request as a basic bot.
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("summarization error: {0}")]
    Summarize(String),

    #[error("composition error: {0}")]
    Compose(String),

    #[error("speech synthesis error: {0}")]
    Synthesize(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("model call failed: {0}")]
    Generation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_text_keeps_summary_verbatim() {
        let result = TopicResult::Summary("Markets rallied today.".to_string());
        assert_eq!(result.as_script_text(), "Markets rallied today.");
    }

    #[test]
    fn script_text_prefixes_failures() {
        let result = TopicResult::Failed("fetch error: connection refused".to_string());
        assert_eq!(
            result.as_script_text(),
            "Error: fetch error: connection refused"
        );
        assert!(result.is_failed());
    }

    #[test]
    fn analysis_preserves_insertion_order() {
        let mut analysis = NewsAnalysis::new();
        analysis.insert("markets".to_string(), TopicResult::Summary("a".to_string()));
        analysis.insert("weather".to_string(), TopicResult::Failed("b".to_string()));

        let topics: Vec<&str> = analysis.iter().map(|(topic, _)| topic).collect();
        assert_eq!(topics, vec!["markets", "weather"]);
        assert_eq!(analysis.len(), 2);
        assert!(analysis.get("weather").unwrap().is_failed());
        assert!(analysis.get("sports").is_none());
    }

    #[test]
    fn analysis_serializes_under_envelope_key() {
        let mut analysis = NewsAnalysis::new();
        analysis.insert("markets".to_string(), TopicResult::Summary("a".to_string()));

        let json = serde_json::to_value(&analysis).unwrap();
        assert!(json.get("news_analysis").is_some());
    }
}
