use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TtsError>;

/// Longest slice of encoder diagnostics echoed back to clients
const ENCODER_STDERR_LIMIT: usize = 200;

/// Synthesis service errors with their HTTP status codes
#[derive(Debug, Error)]
pub enum TtsError {
    /// Malformed request: bad JSON, missing text, bad voice name
    #[error("{0}")]
    InvalidRequest(String),

    /// Request body above the configured limit
    #[error("Request too large")]
    PayloadTooLarge,

    /// Unknown route
    #[error("Not found")]
    NotFound,

    /// Voice pack missing from the voices directory
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// Inference pipeline failed to load or run
    #[error("{0}")]
    Pipeline(String),

    /// Inference produced no audio chunks
    #[error("No audio generated")]
    EmptyOutput,

    /// Output still contained non-finite samples after a pipeline reload
    #[error("NaN in audio output after pipeline reload")]
    NonFiniteOutput,

    /// MP3 encoder failed
    #[error("ffmpeg error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TtsError {
    /// Encoder failure carrying a bounded excerpt of its diagnostics
    pub fn encoding(stderr: &[u8]) -> Self {
        let stderr = String::from_utf8_lossy(stderr);
        Self::Encoding(stderr.chars().take(ENCODER_STDERR_LIMIT).collect())
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::VoiceNotFound(_)
            | Self::Pipeline(_)
            | Self::EmptyOutput
            | Self::NonFiniteOutput
            | Self::Encoding(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body: `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("TTS error: {self}");
        }

        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
