#![allow(clippy::must_use_candidate)]

pub mod cors;
pub mod encoder;
mod env;
pub mod health;
mod loader;
pub mod server;
pub mod telemetry;
pub mod tts;
mod voice;

use serde::Deserialize;

pub use cors::*;
pub use encoder::*;
pub use health::*;
pub use server::*;
pub use telemetry::TelemetryConfig;
pub use tts::*;
pub use voice::is_valid_voice_name;

/// Top-level gateway configuration
///
/// Every section has defaults, so an empty file (or no file at all) yields
/// the stock Kokoro deployment: port 7880, `af_heart`, `ffmpeg` at 128k.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Synthesis configuration
    #[serde(default)]
    pub tts: TtsConfig,
    /// MP3 encoder configuration
    #[serde(default)]
    pub encoder: EncoderConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
