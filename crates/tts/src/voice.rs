use std::{fmt, path::PathBuf};

use crate::error::{Result, TtsError};

/// File extension of a voice pack on disk
const VOICE_EXTENSION: &str = ".pt";

/// Single-letter language code selecting a pipeline (`a`, `b`, `j`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LangCode(char);

impl LangCode {
    pub const fn new(code: char) -> Self {
        Self(code)
    }

    pub const fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for LangCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Voice identifier that passed `^[a-z]{2}_[a-z0-9_]+$`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceName(String);

impl VoiceName {
    /// Validate a voice identifier
    pub fn parse(name: &str) -> Result<Self> {
        if kokoro_config::is_valid_voice_name(name) {
            Ok(Self(name.to_owned()))
        } else {
            Err(TtsError::InvalidRequest(format!("Invalid voice name: {name}")))
        }
    }

    /// Language code encoded by the first letter of the name
    pub fn lang_code(&self) -> LangCode {
        // validated names always start with an ASCII letter
        LangCode(self.0.chars().next().unwrap_or('a'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A voice resolved to its data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicePack {
    pub name: String,
    pub path: PathBuf,
}

/// Directory of `<voice>.pt` files
#[derive(Debug, Clone)]
pub struct VoiceStore {
    dir: PathBuf,
}

impl VoiceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// List available voices, sorted, without the `.pt` suffix
    ///
    /// Hidden files and files with any other extension are skipped.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut voices = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };

            if file_name.starts_with('.') {
                continue;
            }

            if let Some(voice) = file_name.strip_suffix(VOICE_EXTENSION) {
                voices.push(voice.to_owned());
            }
        }

        voices.sort_unstable();

        Ok(voices)
    }

    /// Resolve a voice name to its pack on disk
    pub async fn resolve(&self, name: &str) -> Result<VoicePack> {
        let path = self.dir.join(format!("{name}{VOICE_EXTENSION}"));

        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(VoicePack {
                name: name.to_owned(),
                path,
            }),
            Ok(_) => Err(TtsError::VoiceNotFound(name.to_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(TtsError::VoiceNotFound(name.to_owned())),
            Err(e) => Err(e.into()),
        }
    }
}
