use std::sync::Arc;

use axum::{body::Body, extract::FromRequest};

use crate::{
    error::TtsError,
    server::Server,
    types::{SpeechJob, SpeechRequest},
};

/// Extractor that reads, parses and validates a speech request body
///
/// Bodies over the configured limit are rejected from `Content-Length` alone
/// when the header is present, and while reading otherwise.
pub struct ExtractSpeech(pub SpeechJob);

impl FromRequest<Arc<Server>> for ExtractSpeech {
    type Rejection = TtsError;

    async fn from_request(request: http::Request<Body>, server: &Arc<Server>) -> Result<Self, Self::Rejection> {
        let limits = server.limits();
        let (parts, body) = request.into_parts();

        if let Some(value) = parts.headers.get(http::header::CONTENT_LENGTH) {
            let length = value
                .to_str()
                .ok()
                .and_then(|value| value.trim().parse::<u64>().ok())
                .ok_or_else(|| TtsError::InvalidRequest("Invalid Content-Length".to_string()))?;

            if usize::try_from(length).map_or(true, |length| length > limits.max_body_size) {
                return Err(TtsError::PayloadTooLarge);
            }
        }

        let bytes = axum::body::to_bytes(body, limits.max_body_size).await.map_err(|err| {
            if std::error::Error::source(&err)
                .is_some_and(|source| source.is::<http_body_util::LengthLimitError>())
            {
                TtsError::PayloadTooLarge
            } else {
                TtsError::InvalidRequest(format!("Failed to read request body: {err}"))
            }
        })?;

        let request = parse_body(&bytes)?;

        request
            .validate(server.default_voice(), limits.max_text_length)
            .map(Self)
    }
}

/// Parse a JSON body, telling syntax errors apart from wrong field types
fn parse_body(bytes: &[u8]) -> Result<SpeechRequest, TtsError> {
    serde_json::from_slice(bytes).map_err(|e| {
        if e.is_data() {
            TtsError::InvalidRequest(format!("Invalid request body: {e}"))
        } else {
            TtsError::InvalidRequest("Invalid JSON".to_string())
        }
    })
}
