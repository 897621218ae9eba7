use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

/// State behind the health endpoint
#[derive(Clone)]
pub struct HealthState {
    pub tts: Arc<tts::Server>,
    /// Configured listen port
    pub port: u16,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub pipelines_loaded: Vec<String>,
    pub nan_recoveries: u64,
    pub port: u16,
}

/// Health check handler
pub async fn health_handler(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.tts.model_name().to_string(),
        pipelines_loaded: state.tts.pipelines_loaded().await,
        nan_recoveries: state.tts.nan_recoveries(),
        port: state.port,
    })
}
