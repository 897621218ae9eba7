//! Scripted pipelines for unit tests

use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::{AudioChunk, Pipeline, PipelineFactory};
use crate::{
    error::{Result, TtsError},
    voice::{LangCode, VoicePack},
};

/// What a mock pipeline returns for one `generate` call
#[derive(Debug, Clone)]
pub enum Reply {
    Chunks(Vec<AudioChunk>),
    Fail(String),
    /// Fail and report the pipeline as no longer usable
    Break,
}

impl Reply {
    pub fn clean() -> Self {
        Self::Chunks(vec![vec![0.1, 0.2], vec![0.3]])
    }

    pub fn nan() -> Self {
        Self::Chunks(vec![vec![0.1, f32::NAN], vec![0.3]])
    }
}

#[derive(Debug, Default)]
struct Shared {
    /// Replies for non-warmup calls, shared by every pipeline the factory makes
    script: VecDeque<Reply>,
    warmup_reply: Option<Reply>,
    created: Vec<LangCode>,
    /// (pipeline instance id, text) per generate call
    calls: Vec<(usize, String)>,
    voices_loaded: Vec<String>,
    fail_create: bool,
}

/// Factory whose pipelines replay a shared script
#[derive(Clone, Default)]
pub struct MockFactory {
    shared: Arc<Mutex<Shared>>,
}

pub const WARMUP_TEXT: &str = "warmup";

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue replies for requests; once exhausted every call is clean
    pub fn script(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.shared.lock().unwrap().script.extend(replies);
        self
    }

    pub fn warmup_reply(self, reply: Reply) -> Self {
        self.shared.lock().unwrap().warmup_reply = Some(reply);
        self
    }

    pub fn failing(self) -> Self {
        self.shared.lock().unwrap().fail_create = true;
        self
    }

    pub fn created(&self) -> Vec<LangCode> {
        self.shared.lock().unwrap().created.clone()
    }

    /// Generate calls other than warmups, as (pipeline id, text)
    pub fn inference_calls(&self) -> Vec<(usize, String)> {
        self.shared
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(_, text)| text != WARMUP_TEXT)
            .cloned()
            .collect()
    }

    pub fn warmup_calls(&self) -> usize {
        self.shared
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(_, text)| text == WARMUP_TEXT)
            .count()
    }

    pub fn voices_loaded(&self) -> Vec<String> {
        self.shared.lock().unwrap().voices_loaded.clone()
    }
}

#[async_trait]
impl PipelineFactory for MockFactory {
    async fn create(&self, lang: LangCode) -> Result<Box<dyn Pipeline>> {
        let mut shared = self.shared.lock().unwrap();
        if shared.fail_create {
            return Err(TtsError::Pipeline(format!("cannot load model for '{lang}'")));
        }

        shared.created.push(lang);
        let id = shared.created.len();

        Ok(Box::new(MockPipeline {
            id,
            shared: Arc::clone(&self.shared),
            healthy: true,
        }))
    }
}

pub struct MockPipeline {
    id: usize,
    shared: Arc<Mutex<Shared>>,
    healthy: bool,
}

#[async_trait]
impl Pipeline for MockPipeline {
    async fn load_voice(&mut self, name: &str) -> Result<VoicePack> {
        self.shared.lock().unwrap().voices_loaded.push(name.to_owned());
        Ok(VoicePack {
            name: name.to_owned(),
            path: PathBuf::from(format!("/voices/{name}.pt")),
        })
    }

    async fn generate(&mut self, text: &str, _voice: &VoicePack) -> Result<Vec<AudioChunk>> {
        let mut shared = self.shared.lock().unwrap();
        shared.calls.push((self.id, text.to_owned()));

        let reply = if text == WARMUP_TEXT {
            shared.warmup_reply.clone().unwrap_or_else(Reply::clean)
        } else {
            shared.script.pop_front().unwrap_or_else(Reply::clean)
        };

        match reply {
            Reply::Chunks(chunks) => Ok(chunks),
            Reply::Fail(message) => Err(TtsError::Pipeline(message)),
            Reply::Break => {
                self.healthy = false;
                Err(TtsError::Pipeline("worker exited".to_string()))
            }
        }
    }

    fn is_healthy(&self) -> bool {
        self.healthy
    }
}
