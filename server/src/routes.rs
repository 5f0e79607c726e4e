use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the application router.
///
/// CORS is wide open: previews are requested from arbitrary front-end pages.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::metadata::get_metadata))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
