//! Notion REST API client.
//!
//! This crate provides:
//! - A thin client for pages and database queries (create/update/query)
//! - Database property-type introspection with caching
//! - Typed property payload builders and page value extraction
//! - A creative record repository on top of the client
//! - Exponential backoff with jitter and Retry-After support

pub mod client;
pub mod error;
pub mod metrics;
pub mod properties;
pub mod repo;
pub mod retry;

#[cfg(test)]
mod client_tests;

pub use client::{NotionClient, NotionConfig};
pub use error::{NotionError, NotionResult};
pub use repo::{CardFilter, CreativeCard, CreativeRepository, RenderUpdate, OPTIONAL_PROPERTIES, REQUIRED_PROPERTIES};
pub use retry::RetryConfig;
