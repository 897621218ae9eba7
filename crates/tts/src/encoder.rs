use std::{io::Cursor, process::Stdio, time::Instant};

use async_trait::async_trait;
use axum::{body::Body, response::Response};
use kokoro_config::EncoderConfig;
use kokoro_telemetry::{Histogram, KeyValue, metrics};
use tokio::{io::AsyncWriteExt, process::Command};

use crate::error::{Result, TtsError};

/// Compressed audio ready to send
#[derive(Debug, Clone)]
pub struct EncodedAudio {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl EncodedAudio {
    pub fn mp3(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: "audio/mpeg",
        }
    }

    /// Convert into an HTTP response with content type and length set
    pub fn into_response(self) -> Response {
        let len = self.bytes.len();
        let mut response = Response::new(Body::from(self.bytes));
        let headers = response.headers_mut();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static(self.content_type),
        );
        headers.insert(http::header::CONTENT_LENGTH, http::HeaderValue::from(len));
        response
    }
}

/// Turns raw mono samples into a delivery format
#[async_trait]
pub trait AudioEncoder: Send + Sync {
    async fn encode(&self, samples: &[f32]) -> Result<EncodedAudio>;
}

/// MP3 encoding through an external `ffmpeg` process
///
/// Samples go in as a 16-bit PCM WAV on stdin, MP3 comes back on stdout.
pub struct FfmpegEncoder {
    program: String,
    bitrate: String,
    sample_rate: u32,
    duration: Histogram<f64>,
}

impl FfmpegEncoder {
    pub fn new(config: &EncoderConfig, sample_rate: u32) -> Self {
        let duration = metrics::meter()
            .f64_histogram(metrics::TTS_ENCODE_DURATION)
            .with_unit("s")
            .with_description("Time spent in the MP3 encoder")
            .build();

        Self {
            program: config.program.clone(),
            bitrate: config.bitrate.clone(),
            sample_rate,
            duration,
        }
    }

    async fn run(&self, wav: Vec<u8>) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(["-i", "pipe:0", "-f", "mp3", "-ab", &self.bitrate, "-v", "quiet", "pipe:1"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TtsError::Encoding(format!("failed to start {}: {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TtsError::Encoding("encoder has no stdin".to_string()))?;

        // Feed stdin concurrently so a full stdout pipe cannot deadlock us
        let feeder = tokio::spawn(async move {
            stdin.write_all(&wav).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;

        match feeder.await {
            Ok(Ok(())) => {}
            // An encoder that exits early closes the pipe; its status says why
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(e) => return Err(TtsError::Encoding(format!("encoder input task failed: {e}"))),
        }

        if !output.status.success() {
            return Err(TtsError::encoding(&output.stderr));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl AudioEncoder for FfmpegEncoder {
    async fn encode(&self, samples: &[f32]) -> Result<EncodedAudio> {
        let start = Instant::now();

        let wav = wav_bytes(samples, self.sample_rate)?;
        let result = self.run(wav).await;

        metrics::record_duration(&self.duration, start, &[KeyValue::new("success", result.is_ok())]);

        let bytes = result?;
        tracing::debug!(samples = samples.len(), bytes = bytes.len(), "encoded mp3");

        Ok(EncodedAudio::mp3(bytes))
    }
}

/// Serialize samples as a mono 16-bit PCM WAV file
pub fn wav_bytes(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut buf = Vec::with_capacity(44 + samples.len() * 2);
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut buf), spec).map_err(wav_error)?;
        for &sample in samples {
            writer.write_sample(to_pcm16(sample)).map_err(wav_error)?;
        }
        writer.finalize().map_err(wav_error)?;
    }

    Ok(buf)
}

#[allow(clippy::cast_possible_truncation)]
fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

fn wav_error(e: hound::Error) -> TtsError {
    TtsError::Encoding(format!("failed to build WAV: {e}"))
}
