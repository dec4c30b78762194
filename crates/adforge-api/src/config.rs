//! API configuration.
//!
//! All credentials and tuning are read once at startup; components receive
//! explicit config structs and never consult the environment themselves.

use std::time::Duration;

use thiserror::Error;

use adforge_llm_client::LlmClientConfig;
use adforge_notion::NotionConfig;
use adforge_video_client::VideoClientConfig;

/// Environment variables that must be present at startup.
const REQUIRED_VARS: [&str; 4] = [
    "GROQ_API_KEY",
    "KIE_API_KEY",
    "NOTION_API_KEY",
    "NOTION_DATABASE_ID",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Generation attempt budget (initial call + corrective retries)
    pub generation_attempts: u32,
    /// Suspension between render polling sweeps
    pub poll_interval: Duration,
    /// Maximum render polling sweeps
    pub poll_max_attempts: u32,
    /// LLM client configuration
    pub llm: LlmClientConfig,
    /// Video client configuration
    pub video: VideoClientConfig,
    /// Record store configuration
    pub notion: NotionConfig,
}

impl AppConfig {
    /// Create config from environment variables.
    ///
    /// Absence of any required credential is a fatal startup error, not a
    /// runtime error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| std::env::var(name).map(|v| v.is_empty()).unwrap_or(true))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing.join(", ")));
        }

        let llm = LlmClientConfig::from_env().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let video = VideoClientConfig::from_env().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let notion = NotionConfig::from_env().map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            generation_attempts: std::env::var("GENERATION_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            poll_interval: Duration::from_secs(
                std::env::var("POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            poll_max_attempts: std::env::var("POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            llm,
            video,
            notion,
        })
    }
}
