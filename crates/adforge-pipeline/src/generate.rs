//! Retry controller: generation with corrective retry.
//!
//! Wraps a generation backend with the validator. On a structural failure
//! the corrective description is appended to the instruction and the call
//! reissued; transport failures surface immediately and are never consumed
//! by the loop. Nothing outside the loop is mutated until a payload
//! validates.

use async_trait::async_trait;
use tracing::{info, warn};

use adforge_llm_client::{LlmClient, SET_SYSTEM_PROMPT, SINGLE_SYSTEM_PROMPT};
use adforge_models::{AdLabel, Creative};

use crate::error::{GenerationError, ServiceError};
use crate::validator::{
    validate_set, validate_single, ValidatedPayload, ValidatedSet, ValidationError, ValidationMode,
};

/// Default attempt budget: one initial call plus one corrective retry.
pub const DEFAULT_GENERATION_ATTEMPTS: u32 = 2;

/// A generation call against the hosted language model.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Issue one generation call and return the raw payload text.
    async fn call(&self, instruction: &str, mode: &ValidationMode) -> Result<String, ServiceError>;
}

#[async_trait]
impl GenerationBackend for LlmClient {
    async fn call(&self, instruction: &str, mode: &ValidationMode) -> Result<String, ServiceError> {
        let system = match mode {
            ValidationMode::FullSet => SET_SYSTEM_PROMPT,
            ValidationMode::SingleCreative { .. } => SINGLE_SYSTEM_PROMPT,
        };
        Ok(self.complete(system, instruction).await?)
    }
}

/// Generate a payload for the given mode, retrying with corrective notes.
pub async fn generate_with_retry<B>(
    backend: &B,
    instruction: &str,
    mode: &ValidationMode,
    max_attempts: u32,
) -> Result<ValidatedPayload, GenerationError>
where
    B: GenerationBackend + ?Sized,
{
    match mode {
        ValidationMode::FullSet => {
            attempt_loop(backend, instruction, mode, max_attempts, validate_set)
                .await
                .map(ValidatedPayload::FullSet)
        }
        ValidationMode::SingleCreative { label } => {
            let label = *label;
            attempt_loop(backend, instruction, mode, max_attempts, move |raw| {
                validate_single(raw, label)
            })
            .await
            .map(ValidatedPayload::Single)
        }
    }
}

/// Generate a full creative set, retrying with corrective notes.
pub async fn generate_set_with_retry<B>(
    backend: &B,
    instruction: &str,
    max_attempts: u32,
) -> Result<ValidatedSet, GenerationError>
where
    B: GenerationBackend + ?Sized,
{
    attempt_loop(
        backend,
        instruction,
        &ValidationMode::FullSet,
        max_attempts,
        validate_set,
    )
    .await
}

/// Regenerate a single creative, retrying with corrective notes.
pub async fn generate_single_with_retry<B>(
    backend: &B,
    instruction: &str,
    label: AdLabel,
    max_attempts: u32,
) -> Result<Creative, GenerationError>
where
    B: GenerationBackend + ?Sized,
{
    attempt_loop(
        backend,
        instruction,
        &ValidationMode::SingleCreative { label },
        max_attempts,
        move |raw| validate_single(raw, label),
    )
    .await
}

async fn attempt_loop<B, T, V>(
    backend: &B,
    instruction: &str,
    mode: &ValidationMode,
    max_attempts: u32,
    validate_fn: V,
) -> Result<T, GenerationError>
where
    B: GenerationBackend + ?Sized,
    V: Fn(&str) -> Result<T, ValidationError>,
{
    let max_attempts = max_attempts.max(1);
    let mut current = instruction.to_string();
    let mut last_failure: Option<ValidationError> = None;

    for attempt in 1..=max_attempts {
        info!(attempt, max_attempts, "Issuing generation call");

        let raw = backend.call(&current, mode).await?;

        match validate_fn(&raw) {
            Ok(payload) => {
                info!(attempt, "Generation payload validated");
                return Ok(payload);
            }
            Err(failure) => {
                warn!(
                    attempt,
                    kind = ?failure.kind(),
                    "Generation payload rejected: {}",
                    failure
                );
                current.push_str(&format!(
                    "\n\nYour previous response was rejected: {} Return corrected STRICT JSON only.",
                    failure.corrective()
                ));
                last_failure = Some(failure);
            }
        }
    }

    // last_failure is always set when the loop falls through
    let last = last_failure.unwrap_or_else(|| {
        ValidationError::MalformedStructure("No generation attempt was made.".to_string())
    });
    Err(GenerationError::ExhaustedRetries {
        attempts: max_attempts,
        last,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use adforge_llm_client::LlmError;
    use adforge_models::VideoSlot;
    use serde_json::{json, Value};

    use crate::validator::ValidationErrorKind;

    /// Backend that replays scripted responses and counts calls.
    struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<String, ()>>>,
        calls: AtomicU32,
        last_instruction: Mutex<String>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<String, ()>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
                last_instruction: Mutex::new(String::new()),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn call(
            &self,
            instruction: &str,
            _mode: &ValidationMode,
        ) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_instruction.lock().unwrap() = instruction.to_string();
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(raw)) => Ok(raw),
                Some(Err(())) => Err(ServiceError::Generation(LlmError::EmptyResponse)),
                None => panic!("backend called more times than scripted"),
            }
        }
    }

    fn valid_set_raw() -> String {
        let creatives: Vec<Value> = adforge_models::AdLabel::ALL
            .iter()
            .map(|label| {
                let p = label.placement();
                json!({
                    "ad_label": label.as_str(),
                    "funnel_stage": p.stage.as_str(),
                    "language": p.language.as_str(),
                    "headline": format!("Headline {}", label),
                    "primary_text": "Body copy.",
                    "cta": "Shop now",
                    "video_id": p.slot.as_str(),
                })
            })
            .collect();
        let videos: Vec<Value> = VideoSlot::ALL
            .iter()
            .map(|slot| json!({"video_id": slot.as_str(), "prompt": format!("Concept {}", slot)}))
            .collect();
        json!({"videos": videos, "creatives": creatives}).to_string()
    }

    #[tokio::test]
    async fn test_first_attempt_valid() {
        let backend = ScriptedBackend::new(vec![Ok(valid_set_raw())]);
        let set = generate_set_with_retry(&backend, "make ads", 2).await.unwrap();
        assert_eq!(set.creatives.len(), 7);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_corrective_retry_recovers() {
        let backend = ScriptedBackend::new(vec![
            Ok("not json at all".to_string()),
            Ok(valid_set_raw()),
        ]);
        let set = generate_set_with_retry(&backend, "make ads", 2).await.unwrap();
        assert_eq!(set.creatives.len(), 7);
        assert_eq!(backend.calls(), 2);

        // The reissued instruction carries the corrective note
        let last = backend.last_instruction.lock().unwrap().clone();
        assert!(last.starts_with("make ads"));
        assert!(last.contains("Your previous response was rejected"));
    }

    #[tokio::test]
    async fn test_exhausted_retries_stops_calling() {
        let backend = ScriptedBackend::new(vec![
            Ok("{}".to_string()),
            Ok("still wrong".to_string()),
        ]);
        let err = generate_set_with_retry(&backend, "make ads", 2).await.unwrap_err();

        // Never a third call
        assert_eq!(backend.calls(), 2);
        match err {
            GenerationError::ExhaustedRetries { attempts, last } => {
                assert_eq!(attempts, 2);
                assert_eq!(last.kind(), ValidationErrorKind::MalformedStructure);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhausted_carries_last_failure_kind() {
        // First failure is a label problem, second an empty field; the
        // error must report the LAST one
        let mut missing_label: Value = serde_json::from_str(&valid_set_raw()).unwrap();
        missing_label["creatives"].as_array_mut().unwrap().remove(0);
        let mut empty_field: Value = serde_json::from_str(&valid_set_raw()).unwrap();
        empty_field["creatives"][0]["headline"] = json!("");

        let backend = ScriptedBackend::new(vec![
            Ok(missing_label.to_string()),
            Ok(empty_field.to_string()),
        ]);
        let err = generate_set_with_retry(&backend, "make ads", 2).await.unwrap_err();
        assert_eq!(err.last_failure_kind(), Some(ValidationErrorKind::EmptyField));
    }

    #[tokio::test]
    async fn test_service_error_surfaces_immediately() {
        let backend = ScriptedBackend::new(vec![Err(())]);
        let err = generate_set_with_retry(&backend, "make ads", 2).await.unwrap_err();
        assert_eq!(backend.calls(), 1);
        assert!(matches!(err, GenerationError::Service(_)));
        assert_eq!(err.last_failure_kind(), None);
    }

    #[tokio::test]
    async fn test_single_mode_via_contract_entrypoint() {
        let p = adforge_models::AdLabel::B.placement();
        let raw = json!({
            "ad_label": "B",
            "funnel_stage": p.stage.as_str(),
            "language": p.language.as_str(),
            "headline": "New angle",
            "primary_text": "Tighter copy.",
            "cta": "Start today",
            "video_id": p.slot.as_str(),
        })
        .to_string();

        let backend = ScriptedBackend::new(vec![Ok(raw)]);
        let payload = generate_with_retry(
            &backend,
            "regenerate B",
            &ValidationMode::SingleCreative { label: adforge_models::AdLabel::B },
            2,
        )
        .await
        .unwrap();

        match payload {
            ValidatedPayload::Single(creative) => {
                assert_eq!(creative.label, adforge_models::AdLabel::B);
                assert_eq!(creative.headline, "New angle");
            }
            ValidatedPayload::FullSet(_) => panic!("expected single creative"),
        }
    }
}
