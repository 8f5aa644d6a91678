#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Logging primitives for the Rokvi host.
//!
//! The logger is an explicitly owned [`LoggingHandle`] wrapping a `tracing`
//! dispatcher whose sink pipeline can be swapped atomically: a bootstrap
//! pipeline (console + debug) runs until configuration is available and is
//! then replaced by the pipeline derived from configuration and services.
//!
//! Layout: `record.rs` (captured events), `format.rs` (text and compact JSON
//! event formatters), `locale.rs`, `sink/` (console, capture, shipping sinks),
//! `pipeline.rs` (logger configuration and the filtering layer), `handle.rs`
//! (installation, reload, close), `plan.rs` (environment sink selection).

pub mod error;
pub mod format;
pub mod handle;
pub mod locale;
pub mod pipeline;
pub mod plan;
pub mod record;
pub mod sink;

pub use error::{TelemetryError, TelemetryResult};
pub use format::{CompactJsonFormat, LocaleFields, OutputFormat, TextFormat};
pub use handle::{LoggerPhase, LoggingHandle};
pub use locale::Locale;
pub use pipeline::{LoggerConfiguration, Pipeline};
pub use plan::SinkPlan;
pub use record::LogRecord;
pub use sink::capture::CaptureSink;
pub use sink::console::ConsoleSink;
pub use sink::error_reporting::{Dsn, error_reporting_sink, error_reporting_sink_with};
pub use sink::shipping::{HttpTransport, ShippingOptions, ShippingSink, Transport};
pub use sink::telemetry::{TelemetryConfiguration, telemetry_sink, telemetry_sink_with};
pub use sink::{LogSink, SharedSink};
