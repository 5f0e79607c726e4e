// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use ogp_server::{
    cache::MetadataCache,
    extractor::{ExtractorConfig, MetadataExtractor},
    routes::create_router,
    state::AppState,
};

/// Build an extractor with a fresh cache, so tests never share state.
pub fn test_extractor(capacity: usize, config: ExtractorConfig) -> MetadataExtractor {
    MetadataExtractor::new(MetadataCache::new(capacity), config)
        .expect("Failed to build test extractor")
}

/// Build the full application router wired to a fresh cache.
pub fn create_test_app() -> Router {
    create_test_app_with(ExtractorConfig::default(), None)
}

pub fn create_test_app_with(config: ExtractorConfig, default_target_url: Option<String>) -> Router {
    let state = AppState::new(test_extractor(100, config), default_target_url);
    create_router(state)
}

/// Wrap `head` in a minimal HTML document.
pub fn html_page(head: &str) -> String {
    format!("<!doctype html><html><head>{head}</head><body><p>hello</p></body></html>")
}

/// Serve `body` as HTML at `route`, expecting exactly `expected_calls` hits.
pub async fn mount_page(server: &MockServer, route: &str, body: String, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(body),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// `/?url=<target>` with `target` percent-encoded.
pub fn preview_uri(target: &str) -> String {
    format!("/?url={}", urlencoding::encode(target))
}

// ── Request helpers ──────────────────────────────────────────────────────────

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn send_raw(app: Router, req: Request<Body>) -> Response {
    app.oneshot(req).await.unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = send_raw(app, req).await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
