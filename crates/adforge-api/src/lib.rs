//! Axum HTTP API server.
//!
//! This crate provides:
//! - The generation endpoint (full set: copy, records, renders)
//! - Browse/filter, tagging, notes and regeneration endpoints
//! - Health and readiness probes (readiness checks the store schema)
//! - Startup configuration; missing credentials are a fatal startup error

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
