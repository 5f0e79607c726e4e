use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP clients.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Failures inside the fetch → parse → extract pipeline.
///
/// These never reach a client: `MetadataExtractor::fetch` logs them and
/// answers with an empty tag map instead.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to fetch page: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("failed to parse page: {0}")]
    Parse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("could not resolve host: {0}")]
    Resolve(String),

    #[error("refusing to fetch private or reserved address: {0}")]
    Blocked(String),

    #[error("stopped after {0} redirects")]
    TooManyRedirects(usize),

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

/// Failures while projecting a tag map into a `MetadataRecord`.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("invalid URL {url:?}: {source}")]
    UrlParse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URL {0:?} has no host")]
    MissingHost(String),
}

impl From<BuildError> for AppError {
    fn from(e: BuildError) -> Self {
        tracing::warn!(error = %e, "Could not build metadata record");
        AppError::Validation("Invalid URL".into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, String) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
