//! Scripted inference backend for integration tests
//!
//! Every pipeline the factory creates draws from one shared queue of
//! outcomes; once the queue runs dry, generation is clean.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tts::pipeline::{AudioChunk, Pipeline, PipelineFactory};
use tts::{LangCode, TtsError, VoicePack, VoiceStore};

/// What one non-warmup `generate` call returns
#[derive(Debug, Clone)]
pub enum Outcome {
    Clean,
    Nan,
    Empty,
    Fail(String),
}

const WARMUP_TEXT: &str = "warmup";

#[derive(Default)]
struct State {
    script: VecDeque<Outcome>,
    created: Vec<char>,
    inference_calls: Vec<(usize, String)>,
    fail_create: bool,
}

/// Factory of scripted pipelines; clones share state
#[derive(Clone)]
pub struct ScriptedFactory {
    state: Arc<Mutex<State>>,
    voices: VoiceStore,
}

impl ScriptedFactory {
    /// Pipelines resolve voices against the same directory the server lists
    pub fn new(voices: &std::path::Path) -> Self {
        Self {
            state: Arc::default(),
            voices: VoiceStore::new(voices),
        }
    }

    pub fn script(self, outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        self.state.lock().unwrap().script.extend(outcomes);
        self
    }

    /// Every pipeline creation fails, as when the model cannot load
    pub fn failing(self) -> Self {
        self.state.lock().unwrap().fail_create = true;
        self
    }

    /// Language codes of every pipeline created, in creation order
    pub fn created(&self) -> Vec<char> {
        self.state.lock().unwrap().created.clone()
    }

    /// Non-warmup generate calls as (pipeline number, text)
    pub fn inference_calls(&self) -> Vec<(usize, String)> {
        self.state.lock().unwrap().inference_calls.clone()
    }
}

#[async_trait]
impl PipelineFactory for ScriptedFactory {
    async fn create(&self, lang: LangCode) -> tts::Result<Box<dyn Pipeline>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(TtsError::Pipeline(format!("failed to load model for '{lang}'")));
        }

        state.created.push(lang.as_char());

        Ok(Box::new(ScriptedPipeline {
            id: state.created.len(),
            state: Arc::clone(&self.state),
            voices: self.voices.clone(),
        }))
    }
}

struct ScriptedPipeline {
    id: usize,
    state: Arc<Mutex<State>>,
    voices: VoiceStore,
}

#[async_trait]
impl Pipeline for ScriptedPipeline {
    async fn load_voice(&mut self, name: &str) -> tts::Result<VoicePack> {
        self.voices.resolve(name).await
    }

    async fn generate(&mut self, text: &str, _voice: &VoicePack) -> tts::Result<Vec<AudioChunk>> {
        if text == WARMUP_TEXT {
            return Ok(vec![vec![0.0; 4]]);
        }

        let outcome = {
            let mut state = self.state.lock().unwrap();
            state.inference_calls.push((self.id, text.to_owned()));
            state.script.pop_front().unwrap_or(Outcome::Clean)
        };

        match outcome {
            Outcome::Clean => Ok(vec![vec![0.1, 0.2, 0.3], vec![-0.1]]),
            Outcome::Nan => Ok(vec![vec![0.1, f32::NAN], vec![0.2]]),
            Outcome::Empty => Ok(Vec::new()),
            Outcome::Fail(message) => Err(TtsError::Pipeline(message)),
        }
    }
}
