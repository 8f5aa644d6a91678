//! Console, debug, and test-output sinks.
//!
//! Each sink becomes a `tracing_subscriber::fmt` layer when its pipeline is
//! created; the layer's event formatter is chosen by [`OutputFormat`].

use std::io::{self, Write};

use serde_json::{Map, Value};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{self, TestWriter};
use tracing_subscriber::{Layer, Registry};

use crate::format::{CompactJsonFormat, LocaleFields, OutputFormat, TextFormat};
use crate::locale::Locale;

/// Formatting layer owned by a pipeline.
pub type ConsoleLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
    TestOutput,
}

/// Sink writing one formatted line per event to a standard stream.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    name: &'static str,
    stream: Stream,
    format: OutputFormat,
}

impl ConsoleSink {
    /// Console sink on standard output.
    #[must_use]
    pub const fn stdout(format: OutputFormat) -> Self {
        Self {
            name: "console",
            stream: Stream::Stdout,
            format,
        }
    }

    /// Debug sink on standard error.
    ///
    /// Hosts only register it when [`ConsoleSink::debug_enabled`] holds.
    #[must_use]
    pub const fn debug(format: OutputFormat) -> Self {
        Self {
            name: "debug",
            stream: Stream::Stderr,
            format,
        }
    }

    /// Text sink on the test harness's captured output.
    #[must_use]
    pub const fn test_output(locale: Locale) -> Self {
        Self {
            name: "test_output",
            stream: Stream::TestOutput,
            format: OutputFormat::Text(locale),
        }
    }

    /// Returns `true` in builds with debug assertions.
    #[must_use]
    pub const fn debug_enabled() -> bool {
        cfg!(debug_assertions)
    }

    /// Stable sink name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Rendering used by this sink.
    #[must_use]
    pub const fn format(&self) -> &OutputFormat {
        &self.format
    }

    pub(crate) fn layer(&self, properties: &Map<String, Value>) -> ConsoleLayer {
        let writer = match self.stream {
            Stream::Stdout => BoxMakeWriter::new(io::stdout),
            Stream::Stderr => BoxMakeWriter::new(io::stderr),
            Stream::TestOutput => BoxMakeWriter::new(TestWriter::new),
        };
        self.layer_with(properties, writer)
    }

    pub(crate) fn layer_with(
        &self,
        properties: &Map<String, Value>,
        writer: BoxMakeWriter,
    ) -> ConsoleLayer {
        match &self.format {
            OutputFormat::Text(locale) => fmt::layer::<Registry>()
                .event_format(TextFormat::default())
                .fmt_fields(LocaleFields::new(locale.clone()))
                .with_writer(writer)
                .boxed(),
            OutputFormat::CompactJson => fmt::layer::<Registry>()
                .event_format(CompactJsonFormat::new(properties.clone()))
                .with_writer(writer)
                .boxed(),
        }
    }

    pub(crate) fn flush(&self) {
        let _ = match self.stream {
            Stream::Stdout => io::stdout().flush(),
            Stream::Stderr => io::stderr().flush(),
            Stream::TestOutput => Ok(()),
        };
    }
}
