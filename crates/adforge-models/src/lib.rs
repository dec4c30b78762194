//! Shared data models for the AdForge backend.
//!
//! This crate provides Serde-serializable types for:
//! - Creative sets and the ad variants they own
//! - The fixed label-to-placement table (funnel stage, language, video slot)
//! - Video render jobs and their lifecycle states
//! - Human review tags

pub mod creative;
pub mod render;
pub mod set;

// Re-export common types
pub use creative::{AdLabel, Creative, CreativeStatus, FunnelStage, Language, Placement, Tag};
pub use render::{RenderJob, RenderJobId, RenderState, VideoSlot};
pub use set::{CreativeSet, SetId};
