use crate::types::{PipelineError, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io/v1";

/// Voice, model and output selection for speech synthesis.
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    pub voice_id: String,
    pub model_id: String,
    pub output_format: String,
    pub output_dir: PathBuf,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            voice_id: "JBFqnCBsd6RMkjVDRZzb".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
            output_dir: PathBuf::from("audio"),
        }
    }
}

/// One synthesized broadcast: where it was saved plus the bytes themselves.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl AudioArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Trait for speech-synthesis backends.
#[async_trait]
pub trait SpeechClient: Send + Sync {
    /// Convert `text` into audio bytes using the given configuration.
    async fn synthesize(&self, text: &str, config: &SynthesisConfig) -> Result<Vec<u8>>;
}

#[derive(Debug, Serialize)]
struct SynthesisRequest {
    text: String,
    model_id: String,
}

/// REST client for the ElevenLabs text-to-speech endpoint.
pub struct ElevenLabsClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: ELEVENLABS_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SpeechClient for ElevenLabsClient {
    async fn synthesize(&self, text: &str, config: &SynthesisConfig) -> Result<Vec<u8>> {
        if self.api_key.trim().is_empty() {
            return Err(PipelineError::Config(
                "ElevenLabs API key is required".to_string(),
            ));
        }

        let url = format!("{}/text-to-speech/{}", self.base_url, config.voice_id);
        debug!("synthesis request for {} characters", text.len());

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .query(&[("output_format", config.output_format.as_str())])
            .json(&SynthesisRequest {
                text: text.to_string(),
                model_id: config.model_id.clone(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Synthesize(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let mut audio = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            audio.extend_from_slice(&chunk?);
        }

        if audio.is_empty() {
            return Err(PipelineError::Synthesize(
                "provider returned no audio".to_string(),
            ));
        }

        Ok(audio)
    }
}

/// Converts the final script into an audio file artifact.
pub struct SpeechSynthesizer {
    client: Arc<dyn SpeechClient>,
    config: SynthesisConfig,
}

impl SpeechSynthesizer {
    pub fn new(client: Arc<dyn SpeechClient>) -> Self {
        Self {
            client,
            config: SynthesisConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SynthesisConfig) -> Self {
        self.config = config;
        self
    }

    /// Synthesize `script` and persist it under the output directory.
    /// The filename embeds a second-granularity generation timestamp.
    pub async fn synthesize(&self, script: &str) -> Result<AudioArtifact> {
        let bytes = self.client.synthesize(script, &self.config).await?;

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let filename = format!("tts_{}.mp3", Utc::now().format("%Y%m%d_%H%M%S"));
        let path = self.config.output_dir.join(filename);
        tokio::fs::write(&path, &bytes).await?;

        info!("saved {} bytes of audio to {}", bytes.len(), path.display());
        Ok(AudioArtifact { path, bytes })
    }
}

/// Canned speech backend for tests: fixed bytes, recorded input text.
#[derive(Default)]
pub struct MockSpeechClient {
    failing: bool,
    calls: AtomicU32,
    last_text: Mutex<Option<String>>,
}

impl MockSpeechClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn last_text(&self) -> Option<String> {
        self.last_text.lock().expect("record poisoned").clone()
    }
}

#[async_trait]
impl SpeechClient for MockSpeechClient {
    async fn synthesize(&self, text: &str, _config: &SynthesisConfig) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        *self.last_text.lock().expect("record poisoned") = Some(text.to_string());

        if self.failing {
            return Err(PipelineError::Synthesize(
                "API error (401): invalid credential".to_string(),
            ));
        }

        Ok(b"ID3mock-audio-bytes".to_vec())
    }
}
