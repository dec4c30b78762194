//! Pipeline error types.

use thiserror::Error;

use adforge_llm_client::LlmError;
use adforge_models::RenderJobId;
use adforge_notion::NotionError;
use adforge_video_client::VideoError;

use crate::validator::{ValidationError, ValidationErrorKind};

/// Transport/auth/provider failure from one of the external collaborators.
///
/// Never consumed by the corrective retry loop; surfaced to the caller as-is.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Generation service error: {0}")]
    Generation(#[from] LlmError),

    #[error("Video service error: {0}")]
    Video(#[from] VideoError),

    #[error("Record store error: {0}")]
    Store(#[from] NotionError),
}

/// Outcome of a generation run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Generation failed after {attempts} attempt(s): {last}")]
    ExhaustedRetries {
        attempts: u32,
        last: ValidationError,
    },
}

impl GenerationError {
    /// The structural failure that exhausted the retry budget, if that is
    /// what happened.
    pub fn last_failure_kind(&self) -> Option<ValidationErrorKind> {
        match self {
            GenerationError::ExhaustedRetries { last, .. } => Some(last.kind()),
            GenerationError::Service(_) => None,
        }
    }
}

/// Outcome of a polling run.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Render polling timed out with {} unresolved job(s)", pending.len())]
    Timeout { pending: Vec<RenderJobId> },
}

/// Top-level pipeline error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

impl From<NotionError> for PipelineError {
    fn from(e: NotionError) -> Self {
        PipelineError::Service(ServiceError::Store(e))
    }
}

impl From<VideoError> for PipelineError {
    fn from(e: VideoError) -> Self {
        PipelineError::Service(ServiceError::Video(e))
    }
}

impl From<LlmError> for PipelineError {
    fn from(e: LlmError) -> Self {
        PipelineError::Service(ServiceError::Generation(e))
    }
}
