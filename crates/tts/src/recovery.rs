use std::sync::atomic::{AtomicU64, Ordering};

use kokoro_telemetry::{Counter, KeyValue, metrics};

use crate::voice::LangCode;

/// Receives a notification for every successful NaN recovery
pub trait RecoverySink: Send + Sync {
    fn record(&self, lang: LangCode);

    /// Recoveries since process start
    fn total(&self) -> u64;
}

/// Process-wide recovery count, mirrored to an OpenTelemetry counter
pub struct RecoveryCounter {
    total: AtomicU64,
    counter: Counter<u64>,
}

impl RecoveryCounter {
    pub fn new() -> Self {
        let counter = metrics::meter()
            .u64_counter(metrics::TTS_NAN_RECOVERY_COUNT)
            .with_description("Requests that needed a pipeline reload to clear non-finite output")
            .build();

        Self {
            total: AtomicU64::new(0),
            counter,
        }
    }
}

impl Default for RecoveryCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoverySink for RecoveryCounter {
    fn record(&self, lang: LangCode) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.counter.add(1, &[KeyValue::new("lang", lang.to_string())]);
    }

    fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}
