//! Structural validation of generation payloads.
//!
//! A payload is either a full set (seven creatives plus five video prompts)
//! or a single regenerated creative. Checks run in a fixed order and stop
//! at the first failure; every failure carries a corrective description
//! that can be appended to a retry instruction.
//!
//! The `reused` flag on accepted creatives is always computed from the
//! placement table. Whatever the model claimed is ignored.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use thiserror::Error;

use adforge_models::{AdLabel, Creative, VideoSlot};

/// What shape the payload is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Seven creatives labeled A-G plus five video prompts keyed V1-V5
    FullSet,
    /// Exactly one creative carrying the given label
    SingleCreative { label: AdLabel },
}

/// Failure category, used for diagnostics and retry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    MalformedStructure,
    LabelMismatch,
    SchemaViolation,
    VideoPromptMismatch,
    EmptyField,
}

/// A structural violation, with a human-readable corrective description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    MalformedStructure(String),

    #[error("{0}")]
    LabelMismatch(String),

    #[error("{0}")]
    SchemaViolation(String),

    #[error("{0}")]
    VideoPromptMismatch(String),

    #[error("{0}")]
    EmptyField(String),
}

impl ValidationError {
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::MalformedStructure(_) => ValidationErrorKind::MalformedStructure,
            ValidationError::LabelMismatch(_) => ValidationErrorKind::LabelMismatch,
            ValidationError::SchemaViolation(_) => ValidationErrorKind::SchemaViolation,
            ValidationError::VideoPromptMismatch(_) => ValidationErrorKind::VideoPromptMismatch,
            ValidationError::EmptyField(_) => ValidationErrorKind::EmptyField,
        }
    }

    /// The corrective description, suitable for appending to a
    /// regeneration instruction.
    pub fn corrective(&self) -> &str {
        match self {
            ValidationError::MalformedStructure(msg)
            | ValidationError::LabelMismatch(msg)
            | ValidationError::SchemaViolation(msg)
            | ValidationError::VideoPromptMismatch(msg)
            | ValidationError::EmptyField(msg) => msg,
        }
    }
}

/// A validated full set: creatives in label order plus the prompt per slot.
#[derive(Debug, Clone)]
pub struct ValidatedSet {
    pub creatives: Vec<Creative>,
    pub video_prompts: BTreeMap<VideoSlot, String>,
}

/// A validated payload of either mode.
#[derive(Debug, Clone)]
pub enum ValidatedPayload {
    FullSet(ValidatedSet),
    Single(Creative),
}

// =============================================================================
// Untrusted drafts
// =============================================================================

#[derive(Debug, Deserialize)]
struct SetDraft {
    #[serde(default)]
    videos: Vec<VideoPromptDraft>,
    #[serde(default)]
    creatives: Vec<CreativeDraft>,
}

#[derive(Debug, Deserialize)]
struct VideoPromptDraft {
    #[serde(default)]
    video_id: String,
    #[serde(default)]
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct CreativeDraft {
    #[serde(default)]
    ad_label: String,
    #[serde(default)]
    funnel_stage: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    primary_text: String,
    #[serde(default)]
    cta: String,
    #[serde(default)]
    video_id: String,
}

// =============================================================================
// Validation
// =============================================================================

/// Validate a raw generation payload for the given mode.
pub fn validate(raw: &str, mode: &ValidationMode) -> Result<ValidatedPayload, ValidationError> {
    match mode {
        ValidationMode::FullSet => validate_set(raw).map(ValidatedPayload::FullSet),
        ValidationMode::SingleCreative { label } => {
            validate_single(raw, *label).map(ValidatedPayload::Single)
        }
    }
}

/// Validate a full-set payload.
pub fn validate_set(raw: &str) -> Result<ValidatedSet, ValidationError> {
    let draft: SetDraft = parse_draft(raw)?;

    // Labels: exactly A-G, no duplicates, no extras
    let mut seen = BTreeSet::new();
    for creative in &draft.creatives {
        let label = parse_label(&creative.ad_label)?;
        if !seen.insert(label) {
            return Err(ValidationError::LabelMismatch(format!(
                "Duplicate label {}; each of A-G must appear exactly once.",
                label
            )));
        }
    }
    let missing: Vec<&str> = AdLabel::ALL
        .iter()
        .filter(|l| !seen.contains(l))
        .map(|l| l.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::LabelMismatch(format!(
            "Missing label(s) {}; each of A-G must appear exactly once.",
            missing.join(", ")
        )));
    }

    // Placement of each label against the fixed table
    for creative in &draft.creatives {
        check_placement(creative)?;
    }

    // Video prompts: exactly V1-V5, non-empty, pairwise distinct
    let mut prompts: BTreeMap<VideoSlot, String> = BTreeMap::new();
    for video in &draft.videos {
        let slot = VideoSlot::parse(&video.video_id).ok_or_else(|| {
            ValidationError::VideoPromptMismatch(format!(
                "Unexpected video id '{}'; video prompts must be keyed V1-V5.",
                video.video_id
            ))
        })?;
        let prompt = video.prompt.trim();
        if prompt.is_empty() {
            return Err(ValidationError::VideoPromptMismatch(format!(
                "Video prompt for {} is empty.",
                slot
            )));
        }
        if prompts.insert(slot, prompt.to_string()).is_some() {
            return Err(ValidationError::VideoPromptMismatch(format!(
                "Duplicate video prompt entry for {}.",
                slot
            )));
        }
    }
    let missing_slots: Vec<&str> = VideoSlot::ALL
        .iter()
        .filter(|s| !prompts.contains_key(s))
        .map(|s| s.as_str())
        .collect();
    if !missing_slots.is_empty() {
        return Err(ValidationError::VideoPromptMismatch(format!(
            "Missing video prompt(s) for {}; exactly V1-V5 are required.",
            missing_slots.join(", ")
        )));
    }
    let distinct: BTreeSet<&String> = prompts.values().collect();
    if distinct.len() != prompts.len() {
        return Err(ValidationError::VideoPromptMismatch(
            "Video prompts must be distinct visual concepts; two or more are identical.".to_string(),
        ));
    }

    // Required text fields
    for creative in &draft.creatives {
        check_text_fields(creative)?;
    }

    // Accept, in label order, with the reused flag derived
    let mut by_label: BTreeMap<AdLabel, &CreativeDraft> = BTreeMap::new();
    for creative in &draft.creatives {
        // parse cannot fail here, labels were checked above
        if let Some(label) = AdLabel::parse(&creative.ad_label) {
            by_label.insert(label, creative);
        }
    }
    let creatives = by_label
        .into_iter()
        .map(|(label, draft)| {
            Creative::new(
                label,
                draft.headline.trim(),
                draft.primary_text.trim(),
                draft.cta.trim(),
            )
        })
        .collect();

    Ok(ValidatedSet {
        creatives,
        video_prompts: prompts,
    })
}

/// Validate a single-creative payload against the expected label.
pub fn validate_single(raw: &str, expected: AdLabel) -> Result<Creative, ValidationError> {
    let draft: CreativeDraft = parse_draft(raw)?;

    let label = parse_label(&draft.ad_label)?;
    if label != expected {
        return Err(ValidationError::LabelMismatch(format!(
            "Expected label {}, got {}.",
            expected, label
        )));
    }

    check_placement(&draft)?;
    check_text_fields(&draft)?;

    Ok(Creative::new(
        expected,
        draft.headline.trim(),
        draft.primary_text.trim(),
        draft.cta.trim(),
    ))
}

fn parse_draft<'a, T: Deserialize<'a>>(raw: &'a str) -> Result<T, ValidationError> {
    serde_json::from_str(raw).map_err(|e| {
        ValidationError::MalformedStructure(format!(
            "Response is not a structured JSON record of the expected shape: {}.",
            e
        ))
    })
}

fn parse_label(raw: &str) -> Result<AdLabel, ValidationError> {
    AdLabel::parse(raw).ok_or_else(|| {
        ValidationError::LabelMismatch(format!(
            "Unexpected label '{}'; creatives must be labeled A-G.",
            raw
        ))
    })
}

/// Check a creative's (stage, language, slot) against the fixed table.
fn check_placement(draft: &CreativeDraft) -> Result<(), ValidationError> {
    let label = match AdLabel::parse(&draft.ad_label) {
        Some(label) => label,
        // Label errors are reported by the label check, not here
        None => return Ok(()),
    };
    let placement = label.placement();

    let matches = draft.funnel_stage == placement.stage.as_str()
        && draft.language == placement.language.as_str()
        && draft.video_id == placement.slot.as_str();
    if !matches {
        return Err(ValidationError::SchemaViolation(format!(
            "Label {} must be funnel stage {}, language {}, video {}.",
            label, placement.stage, placement.language, placement.slot
        )));
    }
    Ok(())
}

/// Check the required text fields are non-empty.
fn check_text_fields(draft: &CreativeDraft) -> Result<(), ValidationError> {
    let fields = [
        ("headline", &draft.headline),
        ("primary_text", &draft.primary_text),
        ("cta", &draft.cta),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyField(format!(
                "Field '{}' for label {} must be non-empty.",
                name, draft.ad_label
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
