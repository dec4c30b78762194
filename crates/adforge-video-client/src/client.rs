//! Video service HTTP client.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use adforge_models::RenderJobId;

use crate::error::{VideoError, VideoResult};
use crate::types::{ClipSpec, Envelope, StatusData, StatusSnapshot, SubmitData, SubmitRequest};

/// Configuration for the video client.
#[derive(Debug, Clone)]
pub struct VideoClientConfig {
    /// Base URL of the video provider
    pub base_url: String,
    /// Bearer API key
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Optional completion webhook passed to the provider
    pub callback_url: Option<String>,
    /// Clip constraints sent with every submit
    pub clip: ClipSpec,
}

impl VideoClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.kie.ai".to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            callback_url: None,
            clip: ClipSpec::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> VideoResult<Self> {
        let api_key = std::env::var("KIE_API_KEY")
            .map_err(|_| VideoError::MissingCredentials("KIE_API_KEY is not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("KIE_BASE_URL") {
            config.base_url = base_url;
        }
        config.callback_url = std::env::var("KIE_CALLBACK_URL").ok().filter(|s| !s.is_empty());
        Ok(config)
    }
}

/// Client for the hosted video generation service.
pub struct VideoClient {
    http: Client,
    config: VideoClientConfig,
}

impl VideoClient {
    /// Create a new video client.
    pub fn new(config: VideoClientConfig) -> VideoResult<Self> {
        if config.api_key.is_empty() {
            return Err(VideoError::MissingCredentials(
                "Video API key is empty".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(VideoError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> VideoResult<Self> {
        Self::new(VideoClientConfig::from_env()?)
    }

    /// Submit a render task. Returns the provider-assigned task id.
    pub async fn submit(&self, prompt: &str) -> VideoResult<RenderJobId> {
        let url = format!("{}/api/v1/runway/generate", self.config.base_url);

        let request = SubmitRequest {
            prompt: prompt.to_string(),
            duration: self.config.clip.duration_secs,
            quality: self.config.clip.quality.clone(),
            aspect_ratio: self.config.clip.aspect_ratio.clone(),
            watermark: String::new(),
            callback_url: self.config.callback_url.clone(),
        };

        debug!("Submitting render task");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(VideoError::Network)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(VideoError::RequestFailed(format!(
                "Video request failed ({})",
                status
            )));
        }

        let envelope: Envelope<SubmitData> = response.json().await?;
        check_envelope(&envelope)?;

        envelope
            .data
            .and_then(|d| d.task_id)
            .filter(|id| !id.is_empty())
            .map(RenderJobId::from)
            .ok_or_else(|| VideoError::InvalidResponse("Task id missing".to_string()))
    }

    /// Query a render task's status.
    pub async fn status(&self, job_id: &RenderJobId) -> VideoResult<StatusSnapshot> {
        let url = format!("{}/api/v1/runway/record-detail", self.config.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .query(&[("taskId", job_id.as_str())])
            .send()
            .await
            .map_err(VideoError::Network)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(VideoError::RequestFailed(format!(
                "Video status failed ({})",
                status
            )));
        }

        let envelope: Envelope<StatusData> = response.json().await?;
        check_envelope(&envelope)?;

        let data = envelope
            .data
            .ok_or_else(|| VideoError::InvalidResponse("Status data missing".to_string()))?;

        Ok(snapshot_from_status(data))
    }
}

fn check_envelope<T>(envelope: &Envelope<T>) -> VideoResult<()> {
    match envelope.code {
        Some(code) if code != 200 => Err(VideoError::Upstream {
            code,
            msg: envelope
                .msg
                .clone()
                .unwrap_or_else(|| "Video request failed".to_string()),
        }),
        _ => Ok(()),
    }
}

/// Map the provider's loose state vocabulary onto [`StatusSnapshot`].
///
/// Anything that is neither success nor failure counts as still rendering.
fn snapshot_from_status(data: StatusData) -> StatusSnapshot {
    let state = data.state.as_deref().unwrap_or_default();

    if state.eq_ignore_ascii_case("success") {
        let url = data
            .video_info
            .as_ref()
            .and_then(|info| info.video_url.clone().or_else(|| info.url.clone()))
            .or(data.video_url);
        match url {
            Some(url) => StatusSnapshot::completed(url),
            None => StatusSnapshot::failed("Missing video URL"),
        }
    } else if state.eq_ignore_ascii_case("fail") || state.eq_ignore_ascii_case("failed") {
        StatusSnapshot::failed(data.error.unwrap_or_else(|| "Video render failed".to_string()))
    } else {
        StatusSnapshot::processing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adforge_models::RenderState;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String) -> VideoClient {
        VideoClient::new(VideoClientConfig {
            base_url,
            timeout: Duration::from_secs(2),
            ..VideoClientConfig::new("test-key")
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_submit_returns_task_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/runway/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "msg": "ok",
                "data": {"taskId": "task-abc"}
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let id = client.submit("a sunrise over mountains").await.unwrap();
        assert_eq!(id.as_str(), "task-abc");
    }

    #[tokio::test]
    async fn test_submit_envelope_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/runway/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 402,
                "msg": "insufficient credits"
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client.submit("prompt").await.unwrap_err();
        assert!(matches!(err, VideoError::Upstream { code: 402, .. }));
    }

    #[tokio::test]
    async fn test_status_completed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/runway/record-detail"))
            .and(query_param("taskId", "task-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "data": {
                    "state": "success",
                    "videoInfo": {"videoUrl": "https://cdn.example/clip.mp4"}
                }
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let snapshot = client.status(&RenderJobId::from("task-abc")).await.unwrap();
        assert_eq!(snapshot.state, RenderState::Completed);
        assert_eq!(snapshot.video_url.as_deref(), Some("https://cdn.example/clip.mp4"));
    }

    #[tokio::test]
    async fn test_status_failed_carries_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/runway/record-detail"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "data": {"state": "fail", "error": "nsfw content"}
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let snapshot = client.status(&RenderJobId::from("task-x")).await.unwrap();
        assert_eq!(snapshot.state, RenderState::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("nsfw content"));
    }

    #[test]
    fn test_snapshot_mapping() {
        // Success without any URL is a failure, not a completion
        let snap = snapshot_from_status(StatusData {
            state: Some("SUCCESS".to_string()),
            video_info: None,
            video_url: None,
            error: None,
        });
        assert_eq!(snap.state, RenderState::Failed);

        // Unknown states count as still rendering
        let snap = snapshot_from_status(StatusData {
            state: Some("queueing".to_string()),
            video_info: None,
            video_url: None,
            error: None,
        });
        assert_eq!(snap.state, RenderState::Processing);

        // Top-level videoUrl is a valid fallback
        let snap = snapshot_from_status(StatusData {
            state: Some("success".to_string()),
            video_info: None,
            video_url: Some("https://cdn.example/alt.mp4".to_string()),
            error: None,
        });
        assert_eq!(snap.state, RenderState::Completed);
        assert_eq!(snap.video_url.as_deref(), Some("https://cdn.example/alt.mp4"));
    }
}
