#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod cache;
mod encoder;
mod error;
pub mod pipeline;
mod recovery;
mod request;
mod server;
mod synthesizer;
mod types;
mod voice;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};

pub use cache::PipelineCache;
pub use encoder::{AudioEncoder, EncodedAudio, FfmpegEncoder, wav_bytes};
pub use error::{ErrorBody, Result, TtsError};
pub use recovery::{RecoveryCounter, RecoverySink};
pub use server::{RequestLimits, Server, TtsServerBuilder};
pub use synthesizer::Synthesizer;
pub use types::{SpeechJob, SpeechRequest, VoiceList};
pub use voice::{LangCode, VoiceName, VoicePack, VoiceStore};
use request::ExtractSpeech;

/// Build the speech server from configuration, preloading pipelines
pub async fn build_server(config: &kokoro_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = TtsServerBuilder::new(config)
        .build()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize TTS server: {e}"))?;

    Ok(Arc::new(server))
}

/// Create the endpoint router for speech and voice listing
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new()
        .route("/tts", post(synthesize))
        .route("/voices", get(list_voices).post(list_voices))
}

/// Handle speech synthesis requests
async fn synthesize(State(server): State<Arc<Server>>, ExtractSpeech(job): ExtractSpeech) -> Result<Response> {
    let audio = server.speak(job).await?;

    tracing::info!(bytes = audio.bytes.len(), "generated mp3");

    Ok(audio.into_response())
}

/// List the installed voice packs
async fn list_voices(State(server): State<Arc<Server>>) -> Result<Response> {
    let voices = server.voices().await?;

    Ok(Json(VoiceList { voices }).into_response())
}
