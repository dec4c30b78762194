//! Video render job models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Video slot within a creative set. Each set renders exactly five clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum VideoSlot {
    V1,
    V2,
    V3,
    V4,
    V5,
}

impl VideoSlot {
    /// All slots, in set order.
    pub const ALL: [VideoSlot; 5] = [
        VideoSlot::V1,
        VideoSlot::V2,
        VideoSlot::V3,
        VideoSlot::V4,
        VideoSlot::V5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoSlot::V1 => "V1",
            VideoSlot::V2 => "V2",
            VideoSlot::V3 => "V3",
            VideoSlot::V4 => "V4",
            VideoSlot::V5 => "V5",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

impl fmt::Display for VideoSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque render task identifier assigned by the video provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RenderJobId(pub String);

impl RenderJobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RenderJobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RenderJobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Render task state at the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    /// Accepted by the provider, not yet picked up
    #[default]
    Queued,
    /// Render in progress
    Processing,
    /// Render finished, URL available
    Completed,
    /// Render failed
    Failed,
}

impl RenderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderState::Queued => "Queued",
            RenderState::Processing => "Processing",
            RenderState::Completed => "Completed",
            RenderState::Failed => "Failed",
        }
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderState::Completed | RenderState::Failed)
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One asynchronous render task for a video slot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenderJob {
    /// Provider-assigned task id
    pub job_id: RenderJobId,

    /// Slot this render belongs to
    pub slot: VideoSlot,

    /// Current state; only the poller moves it
    #[serde(default)]
    pub state: RenderState,

    /// Clip URL, present only once completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Provider error message, present only once failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,

    /// Last state change
    pub updated_at: DateTime<Utc>,
}

impl RenderJob {
    /// A freshly submitted job starts out queued.
    pub fn new(job_id: RenderJobId, slot: VideoSlot) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            slot,
            state: RenderState::Queued,
            video_url: None,
            error: None,
            submitted_at: now,
            updated_at: now,
        }
    }

    /// Mark the render in progress.
    pub fn processing(mut self) -> Self {
        self.state = RenderState::Processing;
        self.updated_at = Utc::now();
        self
    }

    /// Mark the render completed with its clip URL.
    pub fn complete(mut self, video_url: impl Into<String>) -> Self {
        self.state = RenderState::Completed;
        self.video_url = Some(video_url.into());
        self.updated_at = Utc::now();
        self
    }

    /// Mark the render failed.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.state = RenderState::Failed;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
        self
    }
}
