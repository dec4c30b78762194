//! Video service request/response types.

use adforge_models::RenderState;
use serde::{Deserialize, Serialize};

/// Target clip constraints, passed through to the provider on submit.
#[derive(Debug, Clone)]
pub struct ClipSpec {
    /// Clip length in seconds
    pub duration_secs: u32,
    /// Provider quality label
    pub quality: String,
    /// Aspect ratio label
    pub aspect_ratio: String,
}

impl Default for ClipSpec {
    fn default() -> Self {
        Self {
            duration_secs: 5,
            quality: "720p".to_string(),
            aspect_ratio: "9:16".to_string(),
        }
    }
}

/// Render submission body.
#[derive(Debug, Serialize)]
pub struct SubmitRequest {
    pub prompt: String,
    pub duration: u32,
    pub quality: String,
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: String,
    #[serde(rename = "waterMark")]
    pub watermark: String,
    #[serde(rename = "callBackUrl", skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

/// Provider response envelope: `{code, msg, data}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitData {
    #[serde(rename = "taskId")]
    pub task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusData {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "videoInfo", default)]
    pub video_info: Option<VideoInfo>,
    #[serde(rename = "videoUrl", default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoInfo {
    #[serde(rename = "videoUrl", default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// One observation of a render task's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: RenderState,
    /// Clip URL, present only when completed
    pub video_url: Option<String>,
    /// Provider error message, present only when failed
    pub error: Option<String>,
}

impl StatusSnapshot {
    pub fn completed(url: impl Into<String>) -> Self {
        Self {
            state: RenderState::Completed,
            video_url: Some(url.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            state: RenderState::Failed,
            video_url: None,
            error: Some(error.into()),
        }
    }

    pub fn processing() -> Self {
        Self {
            state: RenderState::Processing,
            video_url: None,
            error: None,
        }
    }
}
