//! Ad creative models and the fixed label-to-placement table.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::render::VideoSlot;

/// Label of an ad variant within a set. Every set owns exactly one
/// creative per label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum AdLabel {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl AdLabel {
    /// All labels, in set order.
    pub const ALL: [AdLabel; 7] = [
        AdLabel::A,
        AdLabel::B,
        AdLabel::C,
        AdLabel::D,
        AdLabel::E,
        AdLabel::F,
        AdLabel::G,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdLabel::A => "A",
            AdLabel::B => "B",
            AdLabel::C => "C",
            AdLabel::D => "D",
            AdLabel::E => "E",
            AdLabel::F => "F",
            AdLabel::G => "G",
        }
    }

    /// Parse a label from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.as_str() == s)
    }

    /// The fixed placement for this label.
    ///
    /// The table is part of the product contract: it never varies per set.
    pub fn placement(&self) -> Placement {
        match self {
            AdLabel::A => Placement::new(FunnelStage::Awareness, Language::En, VideoSlot::V1),
            AdLabel::B => Placement::new(FunnelStage::Awareness, Language::En, VideoSlot::V2),
            AdLabel::C => Placement::new(FunnelStage::Awareness, Language::En, VideoSlot::V3),
            AdLabel::D => Placement::new(FunnelStage::Mid, Language::En, VideoSlot::V4),
            AdLabel::E => Placement::new(FunnelStage::Mid, Language::En, VideoSlot::V4),
            AdLabel::F => Placement::new(FunnelStage::Conversion, Language::En, VideoSlot::V5),
            AdLabel::G => Placement::new(FunnelStage::Full, Language::Es, VideoSlot::V4),
        }
    }

    /// True when at least one other label is assigned the same video slot.
    pub fn slot_shared(&self) -> bool {
        let slot = self.placement().slot;
        Self::ALL
            .iter()
            .any(|other| other != self && other.placement().slot == slot)
    }
}

impl fmt::Display for AdLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Marketing-intent category assigned per creative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum FunnelStage {
    Awareness,
    Mid,
    Conversion,
    Full,
}

impl FunnelStage {
    pub const ALL: [FunnelStage; 4] = [
        FunnelStage::Awareness,
        FunnelStage::Mid,
        FunnelStage::Conversion,
        FunnelStage::Full,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelStage::Awareness => "Awareness",
            FunnelStage::Mid => "Mid",
            FunnelStage::Conversion => "Conversion",
            FunnelStage::Full => "Full",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

impl fmt::Display for FunnelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Copy language of a creative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    En,
    Es,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::Es => "ES",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "EN" => Some(Language::En),
            "ES" => Some(Language::Es),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed (funnel stage, language, video slot) assignment for a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Placement {
    pub stage: FunnelStage,
    pub language: Language,
    pub slot: VideoSlot,
}

impl Placement {
    pub fn new(stage: FunnelStage, language: Language, slot: VideoSlot) -> Self {
        Self {
            stage,
            language,
            slot,
        }
    }
}

/// Lifecycle status of a creative record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CreativeStatus {
    /// Record created, no asset work started
    #[default]
    NotStarted,
    /// Video render in flight
    Generating,
    /// Copy and (where the render succeeded) video are ready
    Generated,
    /// Human marked the creative finished
    Done,
}

impl CreativeStatus {
    /// Display name used by the record store.
    pub fn as_str(&self) -> &'static str {
        match self {
            CreativeStatus::NotStarted => "Not started",
            CreativeStatus::Generating => "Generating",
            CreativeStatus::Generated => "Generated",
            CreativeStatus::Done => "Done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Not started" => Some(CreativeStatus::NotStarted),
            "Generating" => Some(CreativeStatus::Generating),
            "Generated" => Some(CreativeStatus::Generated),
            "Done" => Some(CreativeStatus::Done),
            _ => None,
        }
    }
}

impl fmt::Display for CreativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Human review tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Tag {
    Draft,
    Testing,
    NeedsRevision,
    Approved,
    Winner,
}

impl Tag {
    pub const ALL: [Tag; 5] = [
        Tag::Draft,
        Tag::Testing,
        Tag::NeedsRevision,
        Tag::Approved,
        Tag::Winner,
    ];

    /// Display name used by the record store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Draft => "Draft",
            Tag::Testing => "Testing",
            Tag::NeedsRevision => "Needs Revision",
            Tag::Approved => "Approved",
            Tag::Winner => "Winner",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ad variant within a creative set.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Creative {
    /// Label within the set (unique per set)
    pub label: AdLabel,

    /// Funnel stage, fixed by the label
    pub funnel_stage: FunnelStage,

    /// Copy language, fixed by the label
    pub language: Language,

    /// Ad headline
    pub headline: String,

    /// Body copy, one to three short paragraphs
    pub primary_text: String,

    /// Call to action
    pub cta: String,

    /// Video slot this creative runs against, fixed by the label
    pub video_slot: VideoSlot,

    /// True when another creative in the set shares the video slot.
    /// Always derived from the placement table, never taken from input.
    pub reused: bool,

    /// Lifecycle status
    #[serde(default)]
    pub status: CreativeStatus,

    /// Human review tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,

    /// Regeneration counter, starts at 1
    #[serde(default = "default_iteration")]
    pub iteration: u32,

    /// Free-text reviewer notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_iteration() -> u32 {
    1
}

impl Creative {
    /// Build a creative from validated copy. Placement-derived fields and
    /// the reused flag come from the label table.
    pub fn new(
        label: AdLabel,
        headline: impl Into<String>,
        primary_text: impl Into<String>,
        cta: impl Into<String>,
    ) -> Self {
        let placement = label.placement();
        Self {
            label,
            funnel_stage: placement.stage,
            language: placement.language,
            headline: headline.into(),
            primary_text: primary_text.into(),
            cta: cta.into(),
            video_slot: placement.slot,
            reused: label.slot_shared(),
            status: CreativeStatus::NotStarted,
            tag: None,
            iteration: 1,
            notes: None,
        }
    }

    /// Replace the copy fields after a regeneration, bumping the iteration.
    pub fn with_new_copy(
        mut self,
        headline: impl Into<String>,
        primary_text: impl Into<String>,
        cta: impl Into<String>,
    ) -> Self {
        self.headline = headline.into();
        self.primary_text = primary_text.into();
        self.cta = cta.into();
        self.iteration += 1;
        self.status = CreativeStatus::Generated;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_table() {
        let expect = [
            (AdLabel::A, FunnelStage::Awareness, Language::En, VideoSlot::V1),
            (AdLabel::B, FunnelStage::Awareness, Language::En, VideoSlot::V2),
            (AdLabel::C, FunnelStage::Awareness, Language::En, VideoSlot::V3),
            (AdLabel::D, FunnelStage::Mid, Language::En, VideoSlot::V4),
            (AdLabel::E, FunnelStage::Mid, Language::En, VideoSlot::V4),
            (AdLabel::F, FunnelStage::Conversion, Language::En, VideoSlot::V5),
            (AdLabel::G, FunnelStage::Full, Language::Es, VideoSlot::V4),
        ];
        for (label, stage, language, slot) in expect {
            let p = label.placement();
            assert_eq!(p.stage, stage, "stage for {}", label);
            assert_eq!(p.language, language, "language for {}", label);
            assert_eq!(p.slot, slot, "slot for {}", label);
        }
    }

    #[test]
    fn test_slot_sharing() {
        // D, E and G all run against V4
        assert!(AdLabel::D.slot_shared());
        assert!(AdLabel::E.slot_shared());
        assert!(AdLabel::G.slot_shared());
        assert!(!AdLabel::A.slot_shared());
        assert!(!AdLabel::B.slot_shared());
        assert!(!AdLabel::C.slot_shared());
        assert!(!AdLabel::F.slot_shared());
    }

    #[test]
    fn test_label_parse_round_trip() {
        for label in AdLabel::ALL {
            assert_eq!(AdLabel::parse(label.as_str()), Some(label));
        }
        assert_eq!(AdLabel::parse("H"), None);
        assert_eq!(AdLabel::parse("a"), None);
    }

    #[test]
    fn test_creative_new_derives_placement() {
        let c = Creative::new(AdLabel::G, "Hola", "Texto", "Compra ya");
        assert_eq!(c.funnel_stage, FunnelStage::Full);
        assert_eq!(c.language, Language::Es);
        assert_eq!(c.video_slot, VideoSlot::V4);
        assert!(c.reused);
        assert_eq!(c.iteration, 1);
        assert_eq!(c.status, CreativeStatus::NotStarted);
    }

    #[test]
    fn test_with_new_copy_bumps_iteration() {
        let c = Creative::new(AdLabel::A, "Old", "Old text", "Old CTA");
        let c = c.with_new_copy("New", "New text", "New CTA");
        assert_eq!(c.headline, "New");
        assert_eq!(c.iteration, 2);
        assert_eq!(c.status, CreativeStatus::Generated);
    }

    #[test]
    fn test_serde_representations() {
        assert_eq!(serde_json::to_value(AdLabel::A).unwrap(), "A");
        assert_eq!(serde_json::to_value(Language::Es).unwrap(), "ES");
        assert_eq!(serde_json::to_value(FunnelStage::Mid).unwrap(), "Mid");
        assert_eq!(
            serde_json::to_value(CreativeStatus::NotStarted).unwrap(),
            "not_started"
        );
        assert_eq!(
            serde_json::from_value::<Language>(serde_json::json!("EN")).unwrap(),
            Language::En
        );
    }

    #[test]
    fn test_status_store_names() {
        assert_eq!(CreativeStatus::NotStarted.as_str(), "Not started");
        assert_eq!(
            CreativeStatus::parse("Not started"),
            Some(CreativeStatus::NotStarted)
        );
        assert_eq!(Tag::NeedsRevision.as_str(), "Needs Revision");
        assert_eq!(Tag::parse("Needs Revision"), Some(Tag::NeedsRevision));
    }
}
