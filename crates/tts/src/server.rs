use std::sync::Arc;

use kokoro_config::Config;
use tokio::sync::Mutex;

use crate::{
    cache::PipelineCache,
    encoder::{AudioEncoder, EncodedAudio, FfmpegEncoder},
    error::Result,
    pipeline::{PipelineFactory, worker::WorkerPipelineFactory},
    recovery::{RecoveryCounter, RecoverySink},
    synthesizer::Synthesizer,
    types::SpeechJob,
    voice::{LangCode, VoiceStore},
};

/// Request size limits applied before synthesis
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub max_body_size: usize,
    pub max_text_length: usize,
}

/// Speech service state shared by every request
///
/// Inference is serialized: the synthesizer lock is held from pipeline lookup
/// through any recovery retry. Encoding runs after the lock is released.
pub struct Server {
    synthesizer: Mutex<Synthesizer>,
    encoder: Box<dyn AudioEncoder>,
    voices: VoiceStore,
    recoveries: Arc<dyn RecoverySink>,
    limits: RequestLimits,
    default_voice: String,
    model_name: String,
}

impl Server {
    /// Synthesize a validated request and encode it to MP3
    pub async fn speak(&self, job: SpeechJob) -> Result<EncodedAudio> {
        tracing::info!(voice = %job.voice, chars = job.text.chars().count(), "TTS: {}", job.preview());

        let samples = {
            let mut synthesizer = self.synthesizer.lock().await;
            synthesizer.synthesize(&job.text, &job.voice).await?
        };

        self.encoder.encode(&samples).await
    }

    /// Sorted voice pack names
    pub async fn voices(&self) -> Result<Vec<String>> {
        self.voices.list().await
    }

    /// Language codes with a live pipeline, in load order
    pub async fn pipelines_loaded(&self) -> Vec<String> {
        self.synthesizer
            .lock()
            .await
            .loaded()
            .into_iter()
            .map(|lang| lang.to_string())
            .collect()
    }

    pub fn nan_recoveries(&self) -> u64 {
        self.recoveries.total()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub const fn limits(&self) -> RequestLimits {
        self.limits
    }

    pub fn default_voice(&self) -> &str {
        &self.default_voice
    }
}

/// Builder for constructing the speech server from configuration
///
/// The worker-process pipeline factory, `ffmpeg` encoder and in-process
/// recovery counter are used unless replaced.
pub struct TtsServerBuilder<'a> {
    config: &'a Config,
    factory: Option<Arc<dyn PipelineFactory>>,
    encoder: Option<Box<dyn AudioEncoder>>,
    recoveries: Option<Arc<dyn RecoverySink>>,
}

impl<'a> TtsServerBuilder<'a> {
    pub const fn new(config: &'a Config) -> Self {
        Self {
            config,
            factory: None,
            encoder: None,
            recoveries: None,
        }
    }

    #[must_use]
    pub fn with_pipeline_factory(mut self, factory: Arc<dyn PipelineFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    #[must_use]
    pub fn with_encoder(mut self, encoder: Box<dyn AudioEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    #[must_use]
    pub fn with_recovery_sink(mut self, recoveries: Arc<dyn RecoverySink>) -> Self {
        self.recoveries = Some(recoveries);
        self
    }

    /// Build the server and load the configured preload pipelines
    ///
    /// Fails if any preload pipeline cannot be created.
    pub async fn build(self) -> Result<Server> {
        let tts = &self.config.tts;
        let voices = VoiceStore::new(&tts.voices_dir);

        let factory = self.factory.unwrap_or_else(|| {
            Arc::new(WorkerPipelineFactory::new(
                tts.worker.clone(),
                tts.model.clone(),
                voices.clone(),
            ))
        });
        let encoder = self
            .encoder
            .unwrap_or_else(|| Box::new(FfmpegEncoder::new(&self.config.encoder, tts.sample_rate)));
        let recoveries = self
            .recoveries
            .unwrap_or_else(|| Arc::new(RecoveryCounter::new()));

        let cache = PipelineCache::new(factory, tts.warmup.clone());
        let mut synthesizer = Synthesizer::new(cache, Arc::clone(&recoveries));

        for &code in &tts.preload {
            synthesizer.preload(LangCode::new(code)).await?;
        }

        tracing::debug!(
            model = %tts.model_name,
            voices_dir = %tts.voices_dir.display(),
            preloaded = tts.preload.len(),
            "TTS server initialized"
        );

        Ok(Server {
            synthesizer: Mutex::new(synthesizer),
            encoder,
            voices,
            recoveries,
            limits: RequestLimits {
                max_body_size: tts.max_body_size,
                max_text_length: tts.max_text_length,
            },
            default_voice: tts.default_voice.clone(),
            model_name: tts.model_name.clone(),
        })
    }
}
