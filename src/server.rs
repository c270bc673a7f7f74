use crate::composer::BroadcastComposer;
use crate::config::AppConfig;
use crate::coordinator::TopicCoordinator;
use crate::fetcher::HeadlineFetcher;
use crate::llm::{GenerationConfig, GroqClient, TextGenerator};
use crate::rate_limit::RateLimiter;
use crate::summarizer::TopicSummarizer;
use crate::synthesizer::{AudioArtifact, ElevenLabsClient, SpeechSynthesizer, SynthesisConfig};
use crate::types::{FetchConfig, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

/// Process-wide cap on feed fetch slots, shared across requests.
pub const RATE_LIMIT_PER_SECOND: u32 = 5;

#[derive(Clone)]
pub struct AppState {
    coordinator: Arc<TopicCoordinator>,
    composer: Arc<BroadcastComposer>,
    synthesizer: Arc<SpeechSynthesizer>,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(
        coordinator: Arc<TopicCoordinator>,
        composer: Arc<BroadcastComposer>,
        synthesizer: Arc<SpeechSynthesizer>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            coordinator,
            composer,
            synthesizer,
            request_timeout,
        }
    }

    /// Wire the production pipeline: Google News fetcher, Groq generation,
    /// ElevenLabs synthesis, one shared rate limiter.
    pub fn from_config(config: &AppConfig) -> Self {
        let limiter = Arc::new(RateLimiter::per_second(RATE_LIMIT_PER_SECOND));
        let generator: Arc<dyn TextGenerator> = Arc::new(GroqClient::new(&config.groq_api_key));

        let mut summary_config = GenerationConfig::summary();
        if let Some(model) = &config.summary_model {
            summary_config = summary_config.with_model(model);
        }
        let mut broadcast_config = GenerationConfig::broadcast();
        if let Some(model) = &config.broadcast_model {
            broadcast_config = broadcast_config.with_model(model);
        }

        let source = Arc::new(HeadlineFetcher::new(FetchConfig::default()));
        let summarizer = TopicSummarizer::new(generator.clone()).with_config(summary_config);
        let coordinator = TopicCoordinator::new(source, summarizer, limiter);
        let composer = BroadcastComposer::new(generator).with_config(broadcast_config);

        let mut synthesis_config = SynthesisConfig {
            output_dir: config.output_dir.clone(),
            ..SynthesisConfig::default()
        };
        if let Some(voice_id) = &config.voice_id {
            synthesis_config.voice_id = voice_id.clone();
        }
        let speech = Arc::new(ElevenLabsClient::new(&config.elevenlabs_api_key));
        let synthesizer = SpeechSynthesizer::new(speech).with_config(synthesis_config);

        Self::new(
            Arc::new(coordinator),
            Arc::new(composer),
            Arc::new(synthesizer),
            config.request_timeout,
        )
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/generate-news-audio", post(generate_news_audio))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct NewsRequest {
    pub topics: Vec<String>,
    #[serde(default)]
    pub source_type: SourceType,
}

/// Which source legs to run. Only the news leg exists; `both` is accepted
/// for callers that request every available source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    News,
    Both,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
}

async fn health() -> Json<HealthReport> {
    Json(HealthReport { status: "ok" })
}

async fn generate_news_audio(
    State(state): State<AppState>,
    Json(request): Json<NewsRequest>,
) -> Response {
    let topics: Vec<String> = request
        .topics
        .iter()
        .map(|topic| topic.trim().to_string())
        .collect();

    if topics.is_empty() || topics.iter().any(|topic| topic.is_empty()) {
        let body = Json(ErrorResponse {
            error: "topics must be a non-empty list of non-empty strings".to_string(),
        });
        return (StatusCode::BAD_REQUEST, body).into_response();
    }

    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        topics = topics.len(),
        source = ?request.source_type,
        "broadcast request accepted"
    );

    match tokio::time::timeout(state.request_timeout, run_pipeline(&state, &topics)).await {
        Err(_) => {
            error!(%request_id, "request deadline exceeded");
            let body = Json(ErrorResponse {
                error: format!("request deadline of {:?} exceeded", state.request_timeout),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
        Ok(Err(e)) => {
            error!(%request_id, "broadcast request failed: {}", e);
            let body = Json(ErrorResponse {
                error: e.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
        Ok(Ok(artifact)) => {
            info!(%request_id, bytes = artifact.len(), "broadcast audio ready");
            (
                [
                    (header::CONTENT_TYPE, "audio/mpeg"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=news-summary.mp3",
                    ),
                ],
                artifact.bytes,
            )
                .into_response()
        }
    }
}

async fn run_pipeline(state: &AppState, topics: &[String]) -> Result<AudioArtifact> {
    let analysis = state.coordinator.run(topics).await;
    let script = state.composer.compose(&analysis, topics).await?;
    state.synthesizer.synthesize(&script).await
}
