//! API routes.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::generate::generate_set;
use crate::handlers::health::{health, ready};
use crate::handlers::records::{
    get_creative, list_creatives, list_sets, regenerate_creative, update_notes, update_tag,
};
use crate::middleware::cors_layer;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Generation
        .route("/generate", post(generate_set))
        // Browse
        .route("/sets", get(list_sets))
        .route("/creatives", get(list_creatives))
        .route("/creatives/:page_id", get(get_creative))
        // Review
        .route("/creatives/:page_id/tag", post(update_tag))
        .route("/creatives/:page_id/notes", post(update_notes))
        .route("/creatives/:page_id/regenerate", post(regenerate_creative));

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}
