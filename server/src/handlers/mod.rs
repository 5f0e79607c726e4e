pub mod metadata;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let cache = state.extractor.cache();

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "ogp-server",
            "version": env!("CARGO_PKG_VERSION"),
            "cache": {
                "entries": cache.len(),
                "capacity": cache.capacity(),
            },
        })),
    )
}
