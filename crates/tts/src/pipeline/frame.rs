//! Framing of inference worker output
//!
//! Every frame starts with a one-byte tag:
//!
//! | tag    | payload                                            |
//! |--------|----------------------------------------------------|
//! | `0x00` | none, ends the utterance                           |
//! | `0x01` | `u32` LE sample count, then that many `f32` LE     |
//! | `0x02` | `u32` LE byte length, then a UTF-8 error message; ends the utterance |

use tokio::io::{AsyncRead, AsyncReadExt};

use super::AudioChunk;
use crate::error::{Result, TtsError};

pub const TAG_END: u8 = 0x00;
pub const TAG_CHUNK: u8 = 0x01;
pub const TAG_ERROR: u8 = 0x02;

/// Ten minutes of 24 kHz audio
pub const MAX_CHUNK_SAMPLES: u32 = 24_000 * 600;
pub const MAX_ERROR_BYTES: u32 = 64 * 1024;
/// Samples accepted across all chunks of one utterance
pub const MAX_UTTERANCE_SAMPLES: usize = MAX_CHUNK_SAMPLES as usize * 4;

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Chunk(AudioChunk),
    Error(String),
    End,
}

/// Read a single frame
///
/// # Errors
///
/// I/O failures, unknown tags and oversized payloads are all
/// [`TtsError::Pipeline`]: the stream cannot be trusted afterwards.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let tag = reader.read_u8().await.map_err(stream_error)?;

    match tag {
        TAG_END => Ok(Frame::End),
        TAG_CHUNK => {
            let count = reader.read_u32_le().await.map_err(stream_error)?;
            if count > MAX_CHUNK_SAMPLES {
                return Err(TtsError::Pipeline(format!(
                    "inference worker sent a chunk of {count} samples (limit {MAX_CHUNK_SAMPLES})"
                )));
            }

            let mut raw = vec![0u8; count as usize * 4];
            reader.read_exact(&mut raw).await.map_err(stream_error)?;

            let samples = raw
                .chunks_exact(4)
                .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
                .collect();

            Ok(Frame::Chunk(samples))
        }
        TAG_ERROR => {
            let len = reader.read_u32_le().await.map_err(stream_error)?;
            if len > MAX_ERROR_BYTES {
                return Err(TtsError::Pipeline(format!(
                    "inference worker sent an error message of {len} bytes"
                )));
            }

            let mut raw = vec![0u8; len as usize];
            reader.read_exact(&mut raw).await.map_err(stream_error)?;

            Ok(Frame::Error(String::from_utf8_lossy(&raw).into_owned()))
        }
        other => Err(TtsError::Pipeline(format!(
            "inference worker sent unknown frame tag 0x{other:02x}"
        ))),
    }
}

/// Outcome of one request to the worker
#[derive(Debug, Clone, PartialEq)]
pub enum Utterance {
    /// Chunks in generation order
    Audio(Vec<AudioChunk>),
    /// The worker rejected the request; the stream is still in sync
    Failed(String),
}

/// Read frames up to the end of one utterance
///
/// # Errors
///
/// Returns [`TtsError::Pipeline`] when the stream itself is broken or the
/// utterance grows past [`MAX_UTTERANCE_SAMPLES`]
pub async fn read_utterance<R>(reader: &mut R) -> Result<Utterance>
where
    R: AsyncRead + Unpin,
{
    read_utterance_bounded(reader, MAX_UTTERANCE_SAMPLES).await
}

async fn read_utterance_bounded<R>(reader: &mut R, max_samples: usize) -> Result<Utterance>
where
    R: AsyncRead + Unpin,
{
    let mut chunks = Vec::new();
    let mut total = 0usize;

    loop {
        match read_frame(reader).await? {
            Frame::Chunk(samples) => {
                total += samples.len();
                if total > max_samples {
                    return Err(TtsError::Pipeline(format!(
                        "inference worker sent more than {max_samples} samples for one utterance"
                    )));
                }
                chunks.push(samples);
            }
            Frame::Error(message) => return Ok(Utterance::Failed(message)),
            Frame::End => return Ok(Utterance::Audio(chunks)),
        }
    }
}

fn stream_error(e: std::io::Error) -> TtsError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        TtsError::Pipeline("inference worker closed its output".to_string())
    } else {
        TtsError::Pipeline(format!("failed to read from inference worker: {e}"))
    }
}
