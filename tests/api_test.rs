use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use newscast::fetcher::MockHeadlineSource;
use newscast::llm::MockTextGenerator;
use newscast::synthesizer::MockSpeechClient;
use newscast::{
    build_router, AppState, BroadcastComposer, RateLimiter, SpeechSynthesizer, SynthesisConfig,
    TopicCoordinator, TopicSummarizer,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_state(
    source: Arc<MockHeadlineSource>,
    speech: Arc<MockSpeechClient>,
    output_dir: &Path,
) -> AppState {
    let generator = Arc::new(MockTextGenerator::new());
    let limiter = Arc::new(RateLimiter::per_second(5));

    let coordinator =
        TopicCoordinator::new(source, TopicSummarizer::new(generator.clone()), limiter);
    let composer = BroadcastComposer::new(generator);
    let synthesizer = SpeechSynthesizer::new(speech).with_config(SynthesisConfig {
        output_dir: output_dir.to_path_buf(),
        ..SynthesisConfig::default()
    });

    AppState::new(
        Arc::new(coordinator),
        Arc::new(composer),
        Arc::new(synthesizer),
        Duration::from_secs(300),
    )
}

fn post_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate-news-audio")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn returns_audio_attachment_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(MockHeadlineSource::new().with_digest("markets", &["Stocks climb"]));
    let state = test_state(source, Arc::new(MockSpeechClient::new()), dir.path());

    let response = build_router(state)
        .oneshot(post_request(serde_json::json!({
            "topics": ["markets"],
            "source_type": "news"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "audio/mpeg"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=news-summary.mp3"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(!body.is_empty());
}

#[tokio::test(start_paused = true)]
async fn synthesis_failure_returns_server_error_without_audio() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(MockHeadlineSource::new().with_digest("markets", &["Stocks climb"]));
    let state = test_state(source, Arc::new(MockSpeechClient::failing()), dir.path());

    let response = build_router(state)
        .oneshot(post_request(serde_json::json!({ "topics": ["markets"] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(error["error"]
        .as_str()
        .unwrap()
        .starts_with("speech synthesis error"));
}

#[tokio::test(start_paused = true)]
async fn empty_topic_list_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(
        Arc::new(MockHeadlineSource::new()),
        Arc::new(MockSpeechClient::new()),
        dir.path(),
    );

    let response = build_router(state)
        .oneshot(post_request(serde_json::json!({ "topics": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn blank_topic_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(
        Arc::new(MockHeadlineSource::new()),
        Arc::new(MockSpeechClient::new()),
        dir.path(),
    );

    let response = build_router(state)
        .oneshot(post_request(serde_json::json!({ "topics": ["markets", "  "] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(
        Arc::new(MockHeadlineSource::new()),
        Arc::new(MockSpeechClient::new()),
        dir.path(),
    );

    let response = build_router(state)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
