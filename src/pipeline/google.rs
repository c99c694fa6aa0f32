//! Google Translate backend for [`Translator`].
//!
//! Uses the keyless `translate_a/single` web endpoint (`client=gtx`). The
//! response is a nested JSON array whose first element lists translated
//! segments: `[[["Bonjour","Hello",…],["le monde","world",…]],…]`.

use crate::pipeline::translate::{TranslateError, Translator};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default endpoint of the web translation API.
pub const GOOGLE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Longest text sent in one request; longer paragraphs keep their original text.
pub const MAX_CHARS: usize = 5000;

/// Translator backed by Google Translate.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(timeout_secs: u64) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TranslateError::Request(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: GOOGLE_ENDPOINT.to_string(),
        })
    }

    /// Point the translator at a different endpoint (proxies, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let len = text.chars().count();
        if len > MAX_CHARS {
            return Err(TranslateError::TextTooLong {
                len,
                max: MAX_CHARS,
            });
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TranslateError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslateError::MalformedResponse(e.to_string()))?;
        let translated = parse_response(&body)
            .ok_or_else(|| TranslateError::MalformedResponse(preview_json(&body)))?;
        debug!("Translated {} chars → {} chars", len, translated.chars().count());
        Ok(translated)
    }
}

/// Concatenate the translated segments of a `gtx` response.
pub fn parse_response(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0)?.as_str())
        .collect();
    (!text.is_empty()).then_some(text)
}

fn preview_json(body: &Value) -> String {
    body.to_string().chars().take(120).collect()
}
