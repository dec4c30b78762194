//! Notion error types.

use thiserror::Error;

/// Result type for Notion operations.
pub type NotionResult<T> = Result<T, NotionError>;

/// Errors that can occur during Notion operations.
#[derive(Debug, Error)]
pub enum NotionError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Database schema is missing required properties: {0}")]
    MissingProperties(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NotionError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    /// Classify an HTTP failure status. `retry_after_ms` only applies to 429.
    pub fn from_http_status(status: u16, body: impl Into<String>, retry_after_ms: Option<u64>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::AuthError(body),
            404 => Self::NotFound(body),
            429 => Self::RateLimited(retry_after_ms.unwrap_or(1000)),
            s if s >= 500 => Self::ServerError(s, body),
            _ => Self::RequestFailed(body),
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NotionError::Network(_) | NotionError::RateLimited(_) | NotionError::ServerError(_, _)
        )
    }

    /// HTTP status behind this error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            NotionError::AuthError(_) => Some(401),
            NotionError::NotFound(_) => Some(404),
            NotionError::RateLimited(_) => Some(429),
            NotionError::ServerError(status, _) => Some(*status),
            _ => None,
        }
    }

    /// Provider-requested retry delay, if any.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            NotionError::RateLimited(ms) => Some(*ms),
            _ => None,
        }
    }
}
