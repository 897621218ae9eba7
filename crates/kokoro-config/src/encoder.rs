use serde::Deserialize;

/// External MP3 encoder invoked per response
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncoderConfig {
    /// Encoder executable, resolved through `PATH` when not absolute
    #[serde(default = "default_program")]
    pub program: String,
    /// Target bitrate passed to `-ab`
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            bitrate: default_bitrate(),
        }
    }
}

fn default_program() -> String {
    "ffmpeg".to_string()
}

fn default_bitrate() -> String {
    "128k".to_string()
}
