//! In-memory sink for assertions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::LogSink;
use crate::record::LogRecord;

#[derive(Debug, Default)]
struct Captured {
    records: Mutex<Vec<LogRecord>>,
    flushes: AtomicUsize,
}

/// Sink that keeps every record it receives.
///
/// Clones share the same buffer, so one handle can be registered with the
/// logger while another is inspected by the caller.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    inner: Arc<Captured>,
}

impl CaptureSink {
    /// Empty capture buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of captured records in arrival order.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.inner
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of captured records in arrival order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .map(|record| record.message)
            .collect()
    }

    /// Number of captured records with exactly `message`.
    #[must_use]
    pub fn count(&self, message: &str) -> usize {
        self.inner
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| record.message == message)
            .count()
    }

    /// Position of the first record with exactly `message`.
    #[must_use]
    pub fn position(&self, message: &str) -> Option<usize> {
        self.inner
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .position(|record| record.message == message)
    }

    /// Number of times the sink was flushed.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.inner.flushes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogSink for CaptureSink {
    fn name(&self) -> &'static str {
        "capture"
    }

    fn emit(&self, record: &LogRecord) {
        self.inner
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }

    async fn flush(&self) {
        self.inner.flushes.fetch_add(1, Ordering::SeqCst);
    }
}
