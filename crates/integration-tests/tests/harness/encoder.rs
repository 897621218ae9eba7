//! Encoder stand-in that skips the external process

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tts::{AudioEncoder, EncodedAudio};

/// Leading bytes of every fake MP3 body
pub const FAKE_MP3_HEADER: &[u8] = b"ID3";

/// Emits `ID3` followed by one byte per sample and records what it saw
#[derive(Clone, Default)]
pub struct FakeEncoder {
    encoded: Arc<Mutex<Vec<Vec<f32>>>>,
}

impl FakeEncoder {
    /// Sample buffers passed to the encoder, in call order
    pub fn encoded(&self) -> Vec<Vec<f32>> {
        self.encoded.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioEncoder for FakeEncoder {
    async fn encode(&self, samples: &[f32]) -> tts::Result<EncodedAudio> {
        self.encoded.lock().unwrap().push(samples.to_vec());

        let mut bytes = FAKE_MP3_HEADER.to_vec();
        bytes.resize(FAKE_MP3_HEADER.len() + samples.len(), 0);
        Ok(EncodedAudio::mp3(bytes))
    }
}
