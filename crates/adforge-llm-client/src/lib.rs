//! HTTP client for the hosted language model.
//!
//! Speaks the OpenAI-compatible chat-completions dialect (Groq). The
//! client returns raw model text; structural validation of that text
//! belongs to the pipeline, not this crate.

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

pub use client::{LlmClient, LlmClientConfig};
pub use error::{LlmError, LlmResult};
pub use prompt::{build_set_instruction, build_single_instruction, SET_SYSTEM_PROMPT, SINGLE_SYSTEM_PROMPT};
