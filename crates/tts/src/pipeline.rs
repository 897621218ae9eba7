pub mod frame;
#[cfg(test)]
pub(crate) mod mock;
pub mod worker;

use async_trait::async_trait;

use crate::{
    error::Result,
    voice::{LangCode, VoicePack},
};

/// Samples emitted by one generation step, in order
pub type AudioChunk = Vec<f32>;

/// A loaded inference model bound to one language code
#[async_trait]
pub trait Pipeline: Send {
    /// Resolve a voice name to the voice data this pipeline consumes
    async fn load_voice(&mut self, name: &str) -> Result<VoicePack>;

    /// Synthesize `text`, returning every emitted chunk in generation order
    async fn generate(&mut self, text: &str, voice: &VoicePack) -> Result<Vec<AudioChunk>>;

    /// Whether the pipeline can still serve requests
    ///
    /// A pipeline reporting `false` is replaced the next time it is requested.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Creates pipelines for language codes
#[async_trait]
pub trait PipelineFactory: Send + Sync {
    async fn create(&self, lang: LangCode) -> Result<Box<dyn Pipeline>>;
}
