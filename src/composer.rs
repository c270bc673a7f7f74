use crate::llm::{GenerationConfig, TextGenerator};
use crate::types::{NewsAnalysis, PipelineError, Result};
use std::sync::Arc;
use tracing::debug;

const TOPIC_SEPARATOR: &str = "\n\n--- NEW TOPIC ---\n\n";

const BROADCAST_SYSTEM_PROMPT: &str = "\
You are a virtual news anchor writing the final script of a spoken news \
broadcast. You receive one block of prepared material per topic and turn \
them into a single continuous narration ready for speech synthesis.

Rules:
- Start directly with the first segment; no introductions.
- Write full spoken-language paragraphs, roughly sixty to one hundred \
twenty seconds of audio per topic.
- Use natural transitions between topics.
- Keep a neutral, professional tone; no markdown or special characters.
- Close the broadcast with a short wrap-up sentence.";

/// Merges all per-topic results into one narration-ready script with a
/// single larger generation call.
pub struct BroadcastComposer {
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
}

impl BroadcastComposer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            config: GenerationConfig::broadcast(),
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Compose the broadcast script. Unlike per-topic failures, an error
    /// here propagates and ends the request.
    pub async fn compose(&self, analysis: &NewsAnalysis, topics: &[String]) -> Result<String> {
        let blocks = build_topic_blocks(analysis, topics);
        debug!("composing broadcast from {} topic blocks", blocks.len());

        let user_prompt = format!(
            "Write broadcast segments for these topics using the material below:\n\n{}",
            blocks.join(TOPIC_SEPARATOR)
        );

        self.generator
            .generate(BROADCAST_SYSTEM_PROMPT, &user_prompt, &self.config)
            .await
            .map_err(|e| PipelineError::Compose(e.to_string()))
    }
}

/// One labeled block per topic, in original request order. Topics whose
/// result text is empty are skipped; failed topics are included as their
/// error text like any other content.
pub fn build_topic_blocks(analysis: &NewsAnalysis, topics: &[String]) -> Vec<String> {
    topics
        .iter()
        .filter_map(|topic| {
            let content = analysis
                .get(topic)
                .map(|result| result.as_script_text())
                .unwrap_or_default();

            if content.is_empty() {
                None
            } else {
                Some(format!("TOPIC: {}\n\n{}", topic, content))
            }
        })
        .collect()
}
