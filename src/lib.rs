pub mod composer;
pub mod config;
pub mod coordinator;
pub mod fetcher;
pub mod llm;
pub mod rate_limit;
pub mod retry;
pub mod server;
pub mod summarizer;
pub mod synthesizer;
pub mod types;

pub use composer::BroadcastComposer;
pub use config::AppConfig;
pub use coordinator::TopicCoordinator;
pub use fetcher::{HeadlineFetcher, HeadlineSource};
pub use llm::{GenerationConfig, GroqClient, TextGenerator};
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
pub use server::{build_router, AppState};
pub use summarizer::TopicSummarizer;
pub use synthesizer::{AudioArtifact, ElevenLabsClient, SpeechSynthesizer, SynthesisConfig};
pub use types::*;
