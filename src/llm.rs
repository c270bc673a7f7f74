use crate::types::{PipelineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tracing::debug;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";

const DEFAULT_SUMMARY_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_BROADCAST_MODEL: &str = "llama-3.3-70b-versatile";

/// Model selection and sampling parameters for one generation call.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationConfig {
    /// Small, fast model for per-topic summaries. Temperature is low but
    /// non-zero: minor lexical variation is fine, drifting off-topic is not.
    pub fn summary() -> Self {
        Self {
            model: DEFAULT_SUMMARY_MODEL.to_string(),
            temperature: 0.4,
            max_tokens: 1000,
        }
    }

    /// Larger model and token budget for final script composition.
    pub fn broadcast() -> Self {
        Self {
            model: DEFAULT_BROADCAST_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 4000,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

/// Trait for text-generation backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one system-instruction + user-content generation call.
    async fn generate(
        &self,
        system_prompt: &str,
        user_content: &str,
        config: &GenerationConfig,
    ) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat-completion client for Groq's OpenAI-compatible API.
pub struct GroqClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: GROQ_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TextGenerator for GroqClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_content: &str,
        config: &GenerationConfig,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_content.to_string(),
                },
            ],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        debug!("chat request to model {}", config.model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Generation(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Generation("response contained no text".to_string()))
    }
}

/// Deterministic generator for tests: echoes user content back, with a
/// scripted number of leading failures and a record of received prompts.
#[derive(Default)]
pub struct MockTextGenerator {
    fail_first: u32,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `count` calls before succeeding.
    pub fn failing_first(count: u32) -> Self {
        Self {
            fail_first: count,
            ..Self::default()
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_first(u32::MAX)
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt record poisoned").clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(
        &self,
        _system_prompt: &str,
        user_content: &str,
        _config: &GenerationConfig,
    ) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        self.prompts
            .lock()
            .expect("prompt record poisoned")
            .push(user_content.to_string());

        if call < self.fail_first {
            return Err(PipelineError::Generation(
                "model temporarily unavailable".to_string(),
            ));
        }

        if user_content.trim().is_empty() {
            return Ok("No major updates are available for this topic right now.".to_string());
        }

        Ok(user_content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_generator_fails_then_recovers() {
        let generator = MockTextGenerator::failing_first(2);
        let config = GenerationConfig::summary();

        assert!(generator.generate("sys", "text", &config).await.is_err());
        assert!(generator.generate("sys", "text", &config).await.is_err());
        assert_eq!(
            generator.generate("sys", "text", &config).await.unwrap(),
            "text"
        );
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn mock_generator_fills_in_for_empty_input() {
        let generator = MockTextGenerator::new();
        let config = GenerationConfig::summary();

        let reply = generator.generate("sys", "   ", &config).await.unwrap();
        assert!(!reply.trim().is_empty());
    }
}
