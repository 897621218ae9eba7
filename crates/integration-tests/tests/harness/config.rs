//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;

use kokoro_config::{Config, CorsConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder reading voices from `voices_dir`
    ///
    /// Nothing is preloaded so tests see pipelines appear on first use.
    pub fn new(voices_dir: &Path) -> Self {
        let mut config = Config::default();
        config.server.listen_address = SocketAddr::from(([127, 0, 0, 1], 7880));
        config.tts.voices_dir = voices_dir.to_path_buf();
        config.tts.preload = Vec::new();

        Self { config }
    }

    /// Languages to load before the server accepts requests
    pub fn with_preload(mut self, codes: &[char]) -> Self {
        self.config.tts.preload = codes.to_vec();
        self
    }

    pub fn with_max_text_length(mut self, max: usize) -> Self {
        self.config.tts.max_text_length = max;
        self
    }

    pub fn with_max_body_size(mut self, max: usize) -> Self {
        self.config.tts.max_body_size = max;
        self
    }

    pub fn with_default_voice(mut self, voice: &str) -> Self {
        self.config.tts.default_voice = voice.to_owned();
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = config;
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}

/// Temporary voices directory holding `<name>.pt` for each name
pub fn voices_dir(names: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    for name in names {
        std::fs::write(dir.path().join(format!("{name}.pt")), b"voice").expect("write voice");
    }
    dir
}
