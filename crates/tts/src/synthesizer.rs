use std::{sync::Arc, time::Instant};

use kokoro_telemetry::{Histogram, KeyValue, metrics};

use crate::{
    cache::PipelineCache,
    error::{Result, TtsError},
    pipeline::Pipeline,
    recovery::RecoverySink,
    voice::{LangCode, VoiceName},
};

/// Runs inference through the pipeline cache and recovers from non-finite output
///
/// A request whose first pass contains NaN or infinite samples gets exactly
/// one more pass on a freshly created pipeline. The retry works around a
/// known model defect and goes away if the model no longer needs it.
pub struct Synthesizer {
    cache: PipelineCache,
    recoveries: Arc<dyn RecoverySink>,
    synthesis_duration: Histogram<f64>,
}

impl Synthesizer {
    pub fn new(cache: PipelineCache, recoveries: Arc<dyn RecoverySink>) -> Self {
        let synthesis_duration = metrics::meter()
            .f64_histogram(metrics::TTS_SYNTHESIS_DURATION)
            .with_unit("s")
            .with_description("Inference time per request, retries included")
            .build();

        Self {
            cache,
            recoveries,
            synthesis_duration,
        }
    }

    /// Load the pipeline for `lang` ahead of the first request
    pub async fn preload(&mut self, lang: LangCode) -> Result<()> {
        self.cache.get(lang).await.map(|_| ())
    }

    /// Language codes with a live pipeline, in load order
    pub fn loaded(&self) -> Vec<LangCode> {
        self.cache.loaded()
    }

    /// Synthesize `text` in `voice`, returning the concatenated samples
    pub async fn synthesize(&mut self, text: &str, voice: &VoiceName) -> Result<Vec<f32>> {
        let start = Instant::now();
        let lang = voice.lang_code();

        let result = self.synthesize_with_recovery(text, voice, lang).await;

        metrics::record_duration(
            &self.synthesis_duration,
            start,
            &[
                KeyValue::new("lang", lang.to_string()),
                KeyValue::new("success", result.is_ok()),
            ],
        );

        result
    }

    async fn synthesize_with_recovery(&mut self, text: &str, voice: &VoiceName, lang: LangCode) -> Result<Vec<f32>> {
        let pipeline = self.cache.get(lang).await?;
        let audio = run_inference(pipeline, text, voice).await?;

        if is_finite(&audio) {
            return Ok(audio);
        }

        tracing::warn!(%lang, %voice, "NaN detected, reloading pipeline");

        let pipeline = self.cache.reload(lang).await?;
        let audio = run_inference(pipeline, text, voice).await?;

        if !is_finite(&audio) {
            return Err(TtsError::NonFiniteOutput);
        }

        self.recoveries.record(lang);
        tracing::info!(
            %lang,
            total = self.recoveries.total(),
            "recovered from NaN output after pipeline reload"
        );

        Ok(audio)
    }
}

/// One inference pass: resolve the voice, generate, concatenate the chunks
async fn run_inference(pipeline: &mut dyn Pipeline, text: &str, voice: &VoiceName) -> Result<Vec<f32>> {
    let pack = pipeline.load_voice(voice.as_str()).await?;
    let chunks = pipeline.generate(text, &pack).await?;

    if chunks.is_empty() {
        return Err(TtsError::EmptyOutput);
    }

    Ok(chunks.concat())
}

fn is_finite(samples: &[f32]) -> bool {
    samples.iter().all(|sample| sample.is_finite())
}
