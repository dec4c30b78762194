//! Set generation handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use adforge_models::{Creative, FunnelStage, RenderJob};
use adforge_pipeline::{PollError, SetRunReport};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Types
// ============================================================================

/// Generation request body.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 500))]
    pub persona: String,
    #[validate(length(min = 1, max = 500))]
    pub market: String,
    /// Primary funnel focus; defaults to Full
    pub funnel_stage: Option<String>,
}

/// One creative in the generation response.
#[derive(Serialize)]
pub struct CreativeView {
    pub label: String,
    pub funnel_stage: String,
    pub language: String,
    pub headline: String,
    pub primary_text: String,
    pub cta: String,
    pub video_id: String,
    pub reused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

/// One render job in the generation response.
#[derive(Serialize)]
pub struct JobView {
    pub job_id: String,
    pub video_id: String,
    pub state: String,
}

/// Generation response body.
#[derive(Serialize)]
pub struct GenerateResponse {
    pub set_id: String,
    pub persona: String,
    pub market: String,
    pub funnel_stage: String,
    pub creatives: Vec<CreativeView>,
    pub jobs: Vec<JobView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Generate a full creative set.
///
/// Returns once copy is validated, records are created and renders are
/// submitted. Render polling continues in the background and updates the
/// records as jobs finish.
pub async fn generate_set(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let funnel_focus = match request.funnel_stage.as_deref() {
        None | Some("") => FunnelStage::Full,
        Some(raw) => FunnelStage::parse(raw)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown funnel stage '{raw}'")))?,
    };

    let report = state
        .pipeline
        .run_set(&request.persona, &request.market, funnel_focus)
        .await?;

    spawn_render_watch(&state, &report);

    Ok(Json(to_response(report)))
}

/// Watch the report's renders in the background, recording transitions.
fn spawn_render_watch(state: &AppState, report: &SetRunReport) {
    if report.jobs.is_empty() {
        return;
    }

    let pipeline = std::sync::Arc::clone(&state.pipeline);
    let report = report.clone();
    tokio::spawn(async move {
        match pipeline.watch_renders(&report).await {
            Ok(summary) => {
                info!(
                    set_id = %report.set.set_id,
                    attempts = summary.attempts,
                    completed = summary.completed(),
                    failed = summary.failed(),
                    "Render polling finished"
                );
            }
            Err(PollError::Timeout { pending }) => {
                warn!(
                    set_id = %report.set.set_id,
                    pending = pending.len(),
                    "Render polling timed out with unresolved jobs"
                );
            }
        }
    });
}

fn to_response(report: SetRunReport) -> GenerateResponse {
    let creatives = report
        .creatives
        .iter()
        .map(|c| creative_view(c, report.pages.get(&c.label).cloned()))
        .collect();
    let jobs = report
        .jobs
        .iter()
        .map(|job| job_view(job))
        .collect();

    GenerateResponse {
        set_id: report.set.set_id.to_string(),
        persona: report.set.persona,
        market: report.set.market,
        funnel_stage: report.set.funnel_focus.to_string(),
        creatives,
        jobs,
        errors: report.errors,
    }
}

fn creative_view(creative: &Creative, record_id: Option<String>) -> CreativeView {
    CreativeView {
        label: creative.label.to_string(),
        funnel_stage: creative.funnel_stage.to_string(),
        language: creative.language.to_string(),
        headline: creative.headline.clone(),
        primary_text: creative.primary_text.clone(),
        cta: creative.cta.clone(),
        video_id: creative.video_slot.to_string(),
        reused: creative.reused,
        record_id,
    }
}

fn job_view(job: &RenderJob) -> JobView {
    JobView {
        job_id: job.job_id.to_string(),
        video_id: job.slot.to_string(),
        state: job.state.to_string(),
    }
}
