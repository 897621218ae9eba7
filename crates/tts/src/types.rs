use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TtsError},
    voice::VoiceName,
};

/// Body of `POST /tts`
#[derive(Debug, Default, Deserialize)]
pub struct SpeechRequest {
    /// Text to speak; missing is treated as empty
    #[serde(default)]
    pub text: String,
    /// Voice pack name; missing or null selects the configured default
    #[serde(default)]
    pub voice: Option<String>,
}

impl SpeechRequest {
    /// Check the request against service limits
    ///
    /// Emptiness is checked before length, length before the voice name.
    pub fn validate(self, default_voice: &str, max_text_length: usize) -> Result<SpeechJob> {
        if self.text.is_empty() {
            return Err(TtsError::InvalidRequest("No text provided".to_string()));
        }

        if self.text.chars().count() > max_text_length {
            return Err(TtsError::InvalidRequest(format!(
                "Text too long (max {max_text_length} chars)"
            )));
        }

        let voice = VoiceName::parse(self.voice.as_deref().unwrap_or(default_voice))?;

        Ok(SpeechJob { text: self.text, voice })
    }
}

/// A validated synthesis request
#[derive(Debug, Clone)]
pub struct SpeechJob {
    pub text: String,
    pub voice: VoiceName,
}

impl SpeechJob {
    /// Leading characters of the text, for logs
    pub fn preview(&self) -> &str {
        match self.text.char_indices().nth(PREVIEW_CHARS) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }
}

const PREVIEW_CHARS: usize = 60;

/// Body of `GET /voices`
#[derive(Debug, Serialize)]
pub struct VoiceList {
    pub voices: Vec<String>,
}
