//! The upload form server.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | the form |
//! | `POST /convert` | convert an upload; the artifact or the form with the failure |
//! | `GET /health` | liveness plus which optional features are on |
//! | `GET /api/languages` | translation targets as JSON |
//!
//! Failed conversions re-render the form with status 400 (validation),
//! 422 (conversion engine) or 500 (resource), and name the failure kind in
//! the `x-conversion-error` header.

pub mod form;
pub mod handlers;
pub mod page;

use crate::convert::Orchestrator;
use crate::output::ConversionFailure;
use axum::extract::multipart::MultipartError;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::warn;

/// Header naming the failure kind on unsuccessful conversions.
pub const ERROR_KIND_HEADER: &str = "x-conversion-error";

/// Default cap on the request body (200 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/convert", post(handlers::convert))
        .route("/health", get(handlers::health))
        .route("/api/languages", get(handlers::languages))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}

/// Errors returned by the web handlers.
#[derive(Debug)]
pub enum WebError {
    /// The multipart body could not be read (malformed, too large, aborted).
    Upload(MultipartError),
    /// The conversion failed; `page` is the form re-rendered with the failure.
    Conversion {
        failure: ConversionFailure,
        page: String,
    },
}

impl From<MultipartError> for WebError {
    fn from(e: MultipartError) -> Self {
        WebError::Upload(e)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::Upload(e) => {
                warn!("Unreadable upload: {}", e);
                (e.status(), e.body_text()).into_response()
            }
            WebError::Conversion { failure, page } => {
                let status = handlers::status_for(failure.kind);
                let mut response = (status, Html(page)).into_response();
                response.headers_mut().insert(
                    ERROR_KIND_HEADER,
                    HeaderValue::from_static(failure.kind.as_str()),
                );
                response
            }
        }
    }
}
