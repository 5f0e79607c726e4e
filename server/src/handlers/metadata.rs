use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::preview::build_record;
use crate::state::AppState;

// ── Query params ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    pub url: Option<String>,
}

// ── Handler ────────────────────────────────────────────────────────────────

/// GET /?url=<encoded-url>
///
/// Returns the preview record for `url`. Fetch and parse failures produce a
/// record with empty fields, never an error. Without a `url` (and no
/// configured default target) the body is `{}`.
pub async fn get_metadata(
    State(state): State<AppState>,
    Query(params): Query<MetadataQuery>,
) -> AppResult<Response> {
    let target = params
        .url
        .filter(|url| !url.is_empty())
        .or_else(|| state.default_target_url.as_deref().map(str::to_string));

    let Some(url) = target else {
        return Ok(Json(json!({})).into_response());
    };

    let tags = state.extractor.fetch(&url).await;
    let record = build_record(&url, &tags)?;

    Ok(Json(record).into_response())
}
