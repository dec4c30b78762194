//! Browse, tag, annotate and regenerate handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use adforge_models::Tag;
use adforge_notion::{CardFilter, CreativeCard};
use adforge_pipeline::RegenerationRequest;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Types
// ============================================================================

/// Browse query params.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub set_id: Option<String>,
    pub funnel_stage: Option<String>,
    pub tag: Option<String>,
}

#[derive(Serialize)]
pub struct CardsResponse {
    pub count: usize,
    pub creatives: Vec<CreativeCard>,
}

#[derive(Serialize)]
pub struct SetsResponse {
    pub sets: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub tag: String,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegenerateBody {
    /// Reviewer feedback to incorporate into the new copy
    #[validate(length(min = 1, max = 2000))]
    pub feedback: String,
}

#[derive(Serialize)]
pub struct RegenerateResponse {
    pub record_id: String,
    pub label: String,
    pub iteration: u32,
    pub headline: String,
    pub primary_text: String,
    pub cta: String,
}

#[derive(Serialize)]
pub struct UpdatedResponse {
    pub record_id: String,
    pub updated: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Browse creatives, newest first, optionally filtered.
pub async fn list_creatives(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<CardsResponse>> {
    let filter = CardFilter {
        set_id: none_if_all(query.set_id),
        stage: none_if_all(query.funnel_stage),
        tag: none_if_all(query.tag),
    };

    let creatives = state.records.list_cards(&filter).await?;
    Ok(Json(CardsResponse {
        count: creatives.len(),
        creatives,
    }))
}

/// Distinct set ids, newest first.
pub async fn list_sets(State(state): State<AppState>) -> ApiResult<Json<SetsResponse>> {
    let sets = state.records.list_set_ids().await?;
    Ok(Json(SetsResponse { sets }))
}

/// Fetch one creative record.
pub async fn get_creative(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> ApiResult<Json<CreativeCard>> {
    let card = state.records.get_card(&page_id).await?;
    Ok(Json(card))
}

/// Set the review tag on a record.
pub async fn update_tag(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Json(request): Json<TagRequest>,
) -> ApiResult<Json<UpdatedResponse>> {
    let tag = Tag::parse(&request.tag)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown tag '{}'", request.tag)))?;

    state.records.update_tag(&page_id, tag).await?;
    Ok(Json(UpdatedResponse {
        record_id: page_id,
        updated: true,
    }))
}

/// Set reviewer notes on a record.
pub async fn update_notes(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Json(request): Json<NotesRequest>,
) -> ApiResult<Json<UpdatedResponse>> {
    state.records.update_notes(&page_id, &request.notes).await?;
    Ok(Json(UpdatedResponse {
        record_id: page_id,
        updated: true,
    }))
}

/// Regenerate one creative's copy with reviewer feedback.
///
/// Only the copy is regenerated. When the record's video slot is shared
/// with other creatives, re-rendering the shared clip is left to the
/// caller.
pub async fn regenerate_creative(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Json(body): Json<RegenerateBody>,
) -> ApiResult<Json<RegenerateResponse>> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let card = state.records.get_card(&page_id).await?;
    let label = card
        .label()
        .ok_or_else(|| ApiError::bad_request("Record does not carry a valid ad label"))?;

    let request = RegenerationRequest {
        page_id: page_id.clone(),
        label,
        persona: card.persona.unwrap_or_default(),
        market: card.market.unwrap_or_default(),
        feedback: body.feedback,
        current_iteration: card.iteration,
    };

    let creative = state.pipeline.regenerate(&request).await?;
    Ok(Json(RegenerateResponse {
        record_id: page_id,
        label: creative.label.to_string(),
        iteration: creative.iteration,
        headline: creative.headline,
        primary_text: creative.primary_text,
        cta: creative.cta,
    }))
}

/// The browse UI sends "All" for unfiltered dropdowns.
fn none_if_all(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "All")
}
