//! Log sinks and transports for tests.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rokvi_telemetry::{
    CaptureSink, ConsoleSink, Locale, LogRecord, LogSink, TelemetryResult, Transport,
};

/// Test output for the harness logger.
///
/// [`TestOutputSink::console`] writes text lines to the output the test
/// runner captures per test; the sink itself keeps every record for
/// assertions.
#[derive(Debug, Clone)]
pub struct TestOutputSink {
    capture: CaptureSink,
    locale: Locale,
}

impl TestOutputSink {
    /// Sink rendering text in `locale`.
    #[must_use]
    pub fn new(locale: Locale) -> Self {
        Self {
            capture: CaptureSink::new(),
            locale,
        }
    }

    /// Console writing to the captured test output.
    #[must_use]
    pub fn console(&self) -> ConsoleSink {
        ConsoleSink::test_output(self.locale.clone())
    }

    /// Records written so far.
    #[must_use]
    pub const fn capture(&self) -> &CaptureSink {
        &self.capture
    }
}

#[async_trait]
impl LogSink for TestOutputSink {
    fn name(&self) -> &'static str {
        "test_capture"
    }

    fn emit(&self, record: &LogRecord) {
        self.capture.emit(record);
    }

    async fn flush(&self) {
        self.capture.flush().await;
    }
}

/// Transport keeping every shipped batch in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl RecordingTransport {
    /// Empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records shipped so far.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages shipped so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .map(|record| record.message)
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, batch: &[LogRecord]) -> TelemetryResult<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(batch);
        Ok(())
    }
}
