//! Log sinks.
//!
//! # Design
//! - Console-style sinks are `fmt` layers (see [`console`]); [`LogSink`] covers
//!   sinks that need an owned [`LogRecord`].
//! - `emit` runs on the logging hot path and must not block on IO; remote
//!   sinks hand records to a background worker.
//! - `flush` is awaited once when the logger closes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Level;

use crate::record::LogRecord;

pub mod capture;
pub mod console;
pub mod error_reporting;
pub mod shipping;
pub mod telemetry;

/// Destination for captured log records.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Stable sink name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Most verbose level this sink accepts.
    fn minimum_level(&self) -> Level {
        Level::TRACE
    }

    /// Returns `true` when the sink accepts events at `level`.
    fn accepts(&self, level: Level) -> bool {
        level <= self.minimum_level()
    }

    /// Deliver a record.
    fn emit(&self, record: &LogRecord);

    /// Deliver anything still buffered.
    async fn flush(&self) {}
}

/// Shared sink handle as stored in pipelines and service collections.
pub type SharedSink = Arc<dyn LogSink>;
