use std::sync::Arc;

use indexmap::{IndexMap, map::Entry};
use kokoro_config::WarmupConfig;
use kokoro_telemetry::{Counter, KeyValue, metrics};

use crate::{
    error::Result,
    pipeline::{Pipeline, PipelineFactory},
    voice::LangCode,
};

/// At most one live pipeline per language code, created and warmed on demand
///
/// Keys keep load order; a replaced pipeline moves to the end.
pub struct PipelineCache {
    factory: Arc<dyn PipelineFactory>,
    warmup: WarmupConfig,
    pipelines: IndexMap<LangCode, Box<dyn Pipeline>>,
    loads: Counter<u64>,
}

impl PipelineCache {
    pub fn new(factory: Arc<dyn PipelineFactory>, warmup: WarmupConfig) -> Self {
        let loads = metrics::meter()
            .u64_counter(metrics::TTS_PIPELINE_LOAD_COUNT)
            .with_description("Inference pipelines created")
            .build();

        Self {
            factory,
            warmup,
            pipelines: IndexMap::new(),
            loads,
        }
    }

    /// Pipeline for `lang`, created and warmed up if absent
    ///
    /// A cached pipeline that reports itself unhealthy is replaced first.
    pub async fn get(&mut self, lang: LangCode) -> Result<&mut (dyn Pipeline + 'static)> {
        if self.pipelines.get(&lang).is_some_and(|pipeline| !pipeline.is_healthy()) {
            tracing::warn!(%lang, "pipeline no longer usable, replacing it");
            self.evict(lang);
        }

        match self.pipelines.entry(lang) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_mut()),
            Entry::Vacant(entry) => {
                let pipeline = load(self.factory.as_ref(), &self.warmup, lang).await?;
                self.loads.add(1, &[KeyValue::new("lang", lang.to_string())]);
                Ok(entry.insert(pipeline).as_mut())
            }
        }
    }

    /// Drop the pipeline for `lang`, returning whether one was cached
    pub fn evict(&mut self, lang: LangCode) -> bool {
        self.pipelines.shift_remove(&lang).is_some()
    }

    /// Evict then recreate the pipeline for `lang`
    ///
    /// The old pipeline is gone before the new one is created, so two never
    /// coexist for the same code.
    pub async fn reload(&mut self, lang: LangCode) -> Result<&mut (dyn Pipeline + 'static)> {
        self.evict(lang);
        self.get(lang).await
    }

    /// Language codes with a live pipeline, in load order
    pub fn loaded(&self) -> Vec<LangCode> {
        self.pipelines.keys().copied().collect()
    }
}

async fn load(factory: &dyn PipelineFactory, warmup: &WarmupConfig, lang: LangCode) -> Result<Box<dyn Pipeline>> {
    tracing::info!(%lang, "loading pipeline");

    let mut pipeline = factory.create(lang).await?;

    // First generation on a fresh model can produce NaN; burn it on throwaway text
    if let Err(e) = warm_up(pipeline.as_mut(), warmup, lang).await {
        tracing::warn!(%lang, "pipeline warmup failed: {e}");
    }

    tracing::info!(%lang, "pipeline ready");

    Ok(pipeline)
}

async fn warm_up(pipeline: &mut dyn Pipeline, warmup: &WarmupConfig, lang: LangCode) -> Result<()> {
    let voice = pipeline.load_voice(warmup.voice_for(lang.as_char())).await?;
    pipeline.generate(&warmup.text, &voice).await?;
    Ok(())
}
