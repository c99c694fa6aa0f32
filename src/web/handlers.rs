//! Route handlers.

use crate::error::ErrorKind;
use crate::languages::{Language, SUPPORTED_LANGUAGES};
use crate::output::{ConversionArtifact, ConversionFailure};
use crate::web::form::{ConversionForm, FormFields};
use crate::web::page::{self, PageModel};
use crate::web::{AppState, WebError};
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Characters left unescaped in an RFC 5987 `filename*` value.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let fields = FormFields::initial(state.orchestrator.default_target_lang());
    Html(state.render(&fields, None))
}

/// `POST /convert`
pub async fn convert(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let form = ConversionForm::read(multipart, state.orchestrator.default_target_lang()).await?;
    let fields = form.fields.clone();

    let (document, options) = match form.into_request() {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected form: {}", e);
            return Err(state.failure(&fields, ConversionFailure::from_error(&e)));
        }
    };

    match state.orchestrator.run(document, &options).await {
        Ok(artifact) => {
            info!("Sending '{}' ({} bytes)", artifact.filename, artifact.bytes.len());
            Ok(download(artifact))
        }
        Err(failure) => Err(state.failure(&fields, failure)),
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "translation": state.orchestrator.supports_translation(),
        "pdf_export": state.orchestrator.supports_pdf_export(),
    }))
}

/// `GET /api/languages`
pub async fn languages() -> Json<&'static [Language]> {
    Json(SUPPORTED_LANGUAGES)
}

/// HTTP status for a failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::ConversionEngine => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Resource => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn download(artifact: ConversionArtifact) -> Response {
    let disposition = HeaderValue::from_str(&content_disposition(&artifact.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(artifact.media_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response()
}

/// `attachment` header with an ASCII fallback name and the exact UTF-8 name.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        utf8_percent_encode(filename, ATTR_CHAR)
    )
}

impl AppState {
    fn render(&self, fields: &FormFields, failure: Option<&ConversionFailure>) -> String {
        page::render(&PageModel {
            fields,
            translation: self.orchestrator.supports_translation(),
            pdf_export: self.orchestrator.supports_pdf_export(),
            failure,
        })
    }

    fn failure(&self, fields: &FormFields, failure: ConversionFailure) -> WebError {
        let page = self.render(fields, Some(&failure));
        WebError::Conversion { failure, page }
    }
}
