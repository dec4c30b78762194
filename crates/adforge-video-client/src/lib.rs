//! HTTP client for the hosted video generation service.
//!
//! Two calls: submit a render task for a prompt, and query a task's
//! status. Clip constraints (duration, quality, aspect ratio) are submit
//! parameters carried in config; the provider enforces them.

pub mod client;
pub mod error;
pub mod types;

pub use client::{VideoClient, VideoClientConfig};
pub use error::{VideoError, VideoResult};
pub use types::{ClipSpec, StatusSnapshot};
