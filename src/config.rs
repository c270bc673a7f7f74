use crate::types::{PipelineError, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Process configuration, loaded once at startup.
///
/// Credentials are hard requirements: a missing key fails boot with an
/// attributable error instead of degrading into a silent no-op later.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub groq_api_key: String,
    pub elevenlabs_api_key: String,
    pub summary_model: Option<String>,
    pub broadcast_model: Option<String>,
    pub voice_id: Option<String>,
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let request_timeout = std::env::var("NEWSCAST_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));

        Ok(Self {
            groq_api_key: require_env("GROQ_API_KEY")?,
            elevenlabs_api_key: require_env("ELEVENLABS_API_KEY")?,
            summary_model: optional_env("NEWSCAST_SUMMARY_MODEL"),
            broadcast_model: optional_env("NEWSCAST_BROADCAST_MODEL"),
            voice_id: optional_env("NEWSCAST_VOICE_ID"),
            output_dir: optional_env("NEWSCAST_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("audio")),
            request_timeout,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(PipelineError::Config(format!("{} must be set", name))),
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_var_is_a_config_error() {
        std::env::remove_var("NEWSCAST_TEST_REQUIRED");
        let error = require_env("NEWSCAST_TEST_REQUIRED").unwrap_err();
        assert!(error.to_string().contains("NEWSCAST_TEST_REQUIRED"));
    }

    #[test]
    fn blank_required_var_is_a_config_error() {
        std::env::set_var("NEWSCAST_TEST_BLANK", "   ");
        assert!(require_env("NEWSCAST_TEST_BLANK").is_err());
        std::env::remove_var("NEWSCAST_TEST_BLANK");
    }

    #[test]
    fn optional_var_filters_blank_values() {
        std::env::set_var("NEWSCAST_TEST_OPTIONAL", "");
        assert_eq!(optional_env("NEWSCAST_TEST_OPTIONAL"), None);
        std::env::set_var("NEWSCAST_TEST_OPTIONAL", "value");
        assert_eq!(
            optional_env("NEWSCAST_TEST_OPTIONAL"),
            Some("value".to_string())
        );
        std::env::remove_var("NEWSCAST_TEST_OPTIONAL");
    }
}
