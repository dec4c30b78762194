//! Chat-completion HTTP client.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::{LlmError, LlmResult};
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

/// Configuration for the LLM client.
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    /// Base URL of the chat-completions API
    pub base_url: String,
    /// Bearer API key
    pub api_key: String,
    /// Model id
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token budget
    pub max_tokens: u32,
}

impl LlmClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: api_key.into(),
            model: "llama-3.3-70b-versatile".to_string(),
            timeout: Duration::from_secs(60),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> LlmResult<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| LlmError::MissingCredentials("GROQ_API_KEY is not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("GROQ_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("GROQ_MODEL") {
            config.model = model;
        }
        Ok(config)
    }
}

/// Client for the hosted language model.
pub struct LlmClient {
    http: Client,
    config: LlmClientConfig,
}

impl LlmClient {
    /// Create a new LLM client.
    pub fn new(config: LlmClientConfig) -> LlmResult<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingCredentials(
                "LLM API key is empty".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> LlmResult<Self> {
        Self::new(LlmClientConfig::from_env()?)
    }

    /// Run one chat completion and return the raw assistant text, with any
    /// markdown code fences stripped.
    pub async fn complete(&self, system: &str, user: &str) -> LlmResult<String> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let request = ChatRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        };

        debug!(model = %self.config.model, "Sending chat completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(LlmError::Network)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream { status, body });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        Ok(strip_code_fences(content).to_string())
    }
}

/// Drop a leading ```json / ``` fence and a trailing ``` fence.
///
/// Models occasionally wrap strict-JSON output in markdown fences despite
/// instructions not to.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}
