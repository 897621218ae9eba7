use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;

/// Synthesis configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TtsConfig {
    /// Path to the model weights handed to every pipeline worker
    #[serde(default = "default_model")]
    pub model: PathBuf,
    /// Model name reported by the health endpoint
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Directory holding `<voice>.pt` voice packs
    #[serde(default = "default_voices_dir")]
    pub voices_dir: PathBuf,
    /// Voice used when a request omits one
    #[serde(default = "default_voice")]
    pub default_voice: String,
    /// Language codes whose pipelines are loaded before serving
    #[serde(default = "default_preload")]
    pub preload: Vec<char>,
    /// Output sample rate of the model in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Largest accepted text, counted in characters
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
    /// Inference worker process
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Per-pipeline warmup pass
    #[serde(default)]
    pub warmup: WarmupConfig,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            model_name: default_model_name(),
            voices_dir: default_voices_dir(),
            default_voice: default_voice(),
            preload: default_preload(),
            sample_rate: default_sample_rate(),
            max_body_size: default_max_body_size(),
            max_text_length: default_max_text_length(),
            worker: WorkerConfig::default(),
            warmup: WarmupConfig::default(),
        }
    }
}

/// Inference worker process spawned once per language code
///
/// `{lang}` and `{model}` in `args` are replaced with the language code and
/// the model path before spawning.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Command to execute
    #[serde(default = "default_worker_command")]
    pub command: String,
    /// Command arguments
    #[serde(default = "default_worker_args")]
    pub args: Vec<String>,
    /// Extra environment variables
    #[serde(default)]
    pub env: IndexMap<String, String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            command: default_worker_command(),
            args: default_worker_args(),
            env: IndexMap::new(),
        }
    }
}

/// Throwaway synthesis pass run once when a pipeline is created
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarmupConfig {
    /// Text synthesized during warmup
    #[serde(default = "default_warmup_text")]
    pub text: String,
    /// Voice used for language codes missing from `voices`
    #[serde(default = "default_warmup_voice")]
    pub default_voice: String,
    /// Warmup voice per language code
    #[serde(default = "default_warmup_voices")]
    pub voices: IndexMap<char, String>,
}

impl WarmupConfig {
    /// Voice to warm a pipeline for `lang_code` with
    pub fn voice_for(&self, lang_code: char) -> &str {
        self.voices.get(&lang_code).unwrap_or(&self.default_voice)
    }
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            text: default_warmup_text(),
            default_voice: default_warmup_voice(),
            voices: default_warmup_voices(),
        }
    }
}

fn default_model() -> PathBuf {
    PathBuf::from("/app/api/src/models/v1_0/kokoro-v1_0.pth")
}

fn default_model_name() -> String {
    "kokoro-v1_0".to_string()
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("/app/api/src/voices/v1_0")
}

fn default_voice() -> String {
    "af_heart".to_string()
}

fn default_preload() -> Vec<char> {
    vec!['a']
}

const fn default_sample_rate() -> u32 {
    24_000
}

const fn default_max_body_size() -> usize {
    1_000_000
}

const fn default_max_text_length() -> usize {
    10_000
}

fn default_worker_command() -> String {
    "kokoro-worker".to_string()
}

fn default_worker_args() -> Vec<String> {
    ["--lang", "{lang}", "--model", "{model}"].map(String::from).to_vec()
}

fn default_warmup_text() -> String {
    "warmup".to_string()
}

fn default_warmup_voice() -> String {
    "af_alloy".to_string()
}

fn default_warmup_voices() -> IndexMap<char, String> {
    IndexMap::from([
        ('a', "af_alloy".to_string()),
        ('b', "bf_emma".to_string()),
        ('j', "jf_alpha".to_string()),
    ])
}
