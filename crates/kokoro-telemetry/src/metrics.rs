//! Metric names and recording helpers

use std::time::Instant;

use opentelemetry::metrics::{Histogram, Meter};

/// Instrumentation scope for every gateway instrument
pub const METER_NAME: &str = "kokoro";

/// Meter from the globally installed provider
///
/// Falls back to a no-op provider when no exporter is configured, so
/// instruments can always be created.
pub fn meter() -> Meter {
    opentelemetry::global::meter(METER_NAME)
}

/// Record the time elapsed since `start` on a histogram, in seconds
pub fn record_duration(histogram: &Histogram<f64>, start: Instant, attributes: &[opentelemetry::KeyValue]) {
    histogram.record(start.elapsed().as_secs_f64(), attributes);
}

// Synthesis
pub const TTS_SYNTHESIS_DURATION: &str = "tts.synthesis.duration";
pub const TTS_ENCODE_DURATION: &str = "tts.encode.duration";
pub const TTS_NAN_RECOVERY_COUNT: &str = "tts.nan_recovery.count";
pub const TTS_PIPELINE_LOAD_COUNT: &str = "tts.pipeline.load.count";
