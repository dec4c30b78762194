//! Creative set models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::creative::FunnelStage;

/// Unique identifier for a generation batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SetId(pub String);

impl SetId {
    /// Generate a new set id of the form `SET-XXXXXXXXXX`.
    pub fn new() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("SET-{}", hex[..10].to_uppercase()))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One generation batch: the persona/market request it was produced from.
///
/// A set owns exactly seven creatives and references five render jobs.
/// It is never mutated after creation; only its children are.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreativeSet {
    /// Unique set id
    pub set_id: SetId,

    /// Target persona, verbatim user input
    pub persona: String,

    /// Target market, verbatim user input
    pub market: String,

    /// Primary funnel focus selected for the request
    pub funnel_focus: FunnelStage,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl CreativeSet {
    pub fn new(
        persona: impl Into<String>,
        market: impl Into<String>,
        funnel_focus: FunnelStage,
    ) -> Self {
        Self {
            set_id: SetId::new(),
            persona: persona.into(),
            market: market.into(),
            funnel_focus,
            created_at: Utc::now(),
        }
    }
}
