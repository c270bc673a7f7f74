use crate::llm::{GenerationConfig, TextGenerator};
use crate::types::{PipelineError, Result};
use std::sync::Arc;
use tracing::debug;

const SUMMARY_SYSTEM_PROMPT: &str = "\
You are a news editor preparing material for a spoken radio bulletin. \
Rewrite the raw headlines you receive into a short, professional news \
summary that reads naturally when spoken aloud by a text-to-speech engine.

Rules:
- Plain spoken-language paragraphs only. No markdown, bullet points, \
special characters or emojis.
- No preamble or framing; begin directly with the news itself.
- Keep a neutral, broadcast-style tone and focus on the most significant \
headlines.
- If there are no headlines, give one brief sentence noting there is \
little to report on the topic.";

/// Turns one topic's headline digest into a short spoken-style summary.
///
/// No internal retry: the coordinator retries the whole fetch+summarize
/// unit so a transient failure always gets a fresh digest.
pub struct TopicSummarizer {
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
}

impl TopicSummarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            config: GenerationConfig::summary(),
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// An empty digest is valid input; the model produces a brief filler
    /// statement for it.
    pub async fn summarize(&self, digest: &str) -> Result<String> {
        debug!("summarizing digest of {} bytes", digest.len());

        self.generator
            .generate(SUMMARY_SYSTEM_PROMPT, digest, &self.config)
            .await
            .map_err(|e| PipelineError::Summarize(e.to_string()))
    }
}
