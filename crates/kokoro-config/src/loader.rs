use std::path::Path;

use crate::{Config, is_valid_voice_name};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_voices()?;
        self.validate_limits()?;
        self.validate_commands()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_voices(&self) -> anyhow::Result<()> {
        let tts = &self.tts;

        if !is_valid_voice_name(&tts.default_voice) {
            anyhow::bail!("tts.default_voice is not a valid voice name: '{}'", tts.default_voice);
        }

        if !is_valid_voice_name(&tts.warmup.default_voice) {
            anyhow::bail!(
                "tts.warmup.default_voice is not a valid voice name: '{}'",
                tts.warmup.default_voice
            );
        }

        for (lang, voice) in &tts.warmup.voices {
            if !lang.is_ascii_lowercase() {
                anyhow::bail!("tts.warmup.voices key must be a lowercase letter: '{lang}'");
            }
            if !is_valid_voice_name(voice) {
                anyhow::bail!("tts.warmup.voices.{lang} is not a valid voice name: '{voice}'");
            }
        }

        for lang in &tts.preload {
            if !lang.is_ascii_lowercase() {
                anyhow::bail!("tts.preload entries must be lowercase letters: '{lang}'");
            }
        }

        Ok(())
    }

    fn validate_limits(&self) -> anyhow::Result<()> {
        if self.tts.max_body_size == 0 {
            anyhow::bail!("tts.max_body_size must be greater than 0");
        }

        if self.tts.max_text_length == 0 {
            anyhow::bail!("tts.max_text_length must be greater than 0");
        }

        if self.tts.sample_rate == 0 {
            anyhow::bail!("tts.sample_rate must be greater than 0");
        }

        Ok(())
    }

    fn validate_commands(&self) -> anyhow::Result<()> {
        if self.tts.worker.command.trim().is_empty() {
            anyhow::bail!("tts.worker.command must not be empty");
        }

        if self.encoder.program.trim().is_empty() {
            anyhow::bail!("encoder.program must not be empty");
        }

        if self.encoder.bitrate.trim().is_empty() {
            anyhow::bail!("encoder.bitrate must not be empty");
        }

        Ok(())
    }

    fn validate_telemetry(&self) -> anyhow::Result<()> {
        let sampling_rate = self
            .telemetry
            .as_ref()
            .and_then(|t| t.tracing.as_ref())
            .map(|t| t.sampling_rate);

        if let Some(rate) = sampling_rate
            && !(0.0..=1.0).contains(&rate)
        {
            anyhow::bail!("telemetry.tracing.sampling_rate must be between 0 and 1, got {rate}");
        }

        Ok(())
    }
}
