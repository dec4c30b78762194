//! Instruction builders for creative generation.
//!
//! The instruction text is the contract with the model: strict JSON, the
//! fixed label table, five distinct video prompts. The pipeline appends
//! corrective notes to these instructions on retry.

use adforge_models::{AdLabel, FunnelStage, SetId};

/// System prompt for full-set generation.
pub const SET_SYSTEM_PROMPT: &str = "You are a creative ads generator. Return STRICT JSON only. \
     No markdown, no commentary, no extra text. Output must parse as JSON.";

/// System prompt for single-creative regeneration.
pub const SINGLE_SYSTEM_PROMPT: &str = "You are a creative ads generator. Return STRICT JSON only. \
     No markdown, no commentary, no extra text. \
     Generate a single ad creative based on the specifications and user feedback.";

/// Build the user instruction for a full creative set.
pub fn build_set_instruction(
    set_id: &SetId,
    persona: &str,
    market: &str,
    funnel_focus: FunnelStage,
) -> String {
    let mut mapping = String::new();
    for label in AdLabel::ALL {
        let p = label.placement();
        mapping.push_str(&format!(
            "  {}: {}, {}, uses {}\n",
            label, p.stage, p.language, p.slot
        ));
    }

    format!(
        r#"Generate ad creatives and video prompts for the following inputs:
Persona: {persona}
Market: {market}
Primary funnel focus: {funnel_focus}
Set ID: {set_id}

Output schema (JSON only):
{{
  "videos": [
    {{"video_id": "V1", "prompt": "..."}},
    {{"video_id": "V2", "prompt": "..."}},
    {{"video_id": "V3", "prompt": "..."}},
    {{"video_id": "V4", "prompt": "..."}},
    {{"video_id": "V5", "prompt": "..."}}
  ],
  "creatives": [
    {{
      "ad_label": "A",
      "funnel_stage": "Awareness",
      "language": "EN",
      "headline": "...",
      "primary_text": "...",
      "cta": "...",
      "video_id": "V1"
    }}
  ]
}}

Rules:
- Return STRICT JSON only. No code fences.
- Create exactly 5 video prompts (V1-V5). Each prompt must be a distinct visual concept aligned to its funnel intent.
- Create exactly 7 creatives with labels A-G and the mapping below:
{mapping}- Primary text should be 1-3 short paragraphs.
- Avoid mentioning tools, models, or providers."#
    )
}

/// Build the user instruction for regenerating one creative with reviewer
/// feedback.
pub fn build_single_instruction(
    label: AdLabel,
    persona: &str,
    market: &str,
    feedback: &str,
) -> String {
    let p = label.placement();
    format!(
        r#"Regenerate ad creative {label} with the following specifications:
Persona: {persona}
Market: {market}
Funnel Stage: {stage}
Language: {language}
Video ID: {slot}

User feedback on the previous version: {feedback}

Return JSON:
{{
  "ad_label": "{label}",
  "funnel_stage": "{stage}",
  "language": "{language}",
  "headline": "...",
  "primary_text": "...",
  "cta": "...",
  "video_id": "{slot}"
}}

Rules:
- Return STRICT JSON only. No code fences.
- Incorporate the user feedback into the new copy.
- Primary text should be 1-3 short paragraphs.
- Avoid mentioning tools, models, or providers."#,
        label = label,
        persona = persona,
        market = market,
        stage = p.stage,
        language = p.language,
        slot = p.slot,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use adforge_models::VideoSlot;

    #[test]
    fn test_set_instruction_carries_mapping() {
        let set_id = SetId::from("SET-TEST000001");
        let text = build_set_instruction(&set_id, "busy parent", "US skincare", FunnelStage::Full);
        assert!(text.contains("Persona: busy parent"));
        assert!(text.contains("Market: US skincare"));
        assert!(text.contains("SET-TEST000001"));
        assert!(text.contains("G: Full, ES, uses V4"));
        assert!(text.contains("A: Awareness, EN, uses V1"));
    }

    #[test]
    fn test_single_instruction_pins_placement() {
        let text = build_single_instruction(AdLabel::D, "persona", "market", "shorter headline");
        assert!(text.contains("Regenerate ad creative D"));
        assert!(text.contains("Funnel Stage: Mid"));
        assert!(text.contains("Language: EN"));
        assert!(text.contains("\"video_id\": \"V4\""));
        assert!(text.contains("shorter headline"));
    }

    #[test]
    fn test_single_instruction_language_from_table() {
        let text = build_single_instruction(AdLabel::G, "p", "m", "f");
        assert!(text.contains("Language: ES"));
        assert!(!text.contains("Language: EN"));
    }

    #[test]
    fn test_slots_enumerated_in_schema() {
        let set_id = SetId::from("SET-TEST000001");
        let text = build_set_instruction(&set_id, "p", "m", FunnelStage::Awareness);
        for slot in VideoSlot::ALL {
            assert!(text.contains(slot.as_str()));
        }
    }
}
