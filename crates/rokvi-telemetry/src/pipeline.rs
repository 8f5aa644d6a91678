//! Logger configuration and the filtering layer.
//!
//! # Design
//! - [`LoggerConfiguration`] collects levels, enrichment properties, console
//!   sinks, and record sinks; [`LoggerConfiguration::create_pipeline`] freezes
//!   them into a [`Pipeline`].
//! - A pipeline is a `tracing_subscriber` layer: it filters by target, hands
//!   each accepted event to its `fmt` console layers, and captures it once for
//!   the record sinks.

use std::fmt;

use rokvi_config::{LogSinkKind, LoggingOptions};
use serde_json::{Map, Value};
use tracing::level_filters::LevelFilter;
use tracing::span::{Attributes, Id, Record};
use tracing::subscriber::Interest;
use tracing::{Event, Metadata};
use tracing_subscriber::Registry;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::{Context, Layer};

use crate::format::OutputFormat;
use crate::locale::Locale;
use crate::record::LogRecord;
use crate::sink::SharedSink;
use crate::sink::console::{ConsoleLayer, ConsoleSink};

/// Builder for a logging [`Pipeline`].
#[derive(Clone)]
pub struct LoggerConfiguration {
    minimum_level: LevelFilter,
    overrides: Vec<(String, LevelFilter)>,
    properties: Map<String, Value>,
    consoles: Vec<ConsoleSink>,
    sinks: Vec<SharedSink>,
    names: Vec<&'static str>,
}

impl Default for LoggerConfiguration {
    fn default() -> Self {
        Self {
            minimum_level: LevelFilter::INFO,
            overrides: Vec::new(),
            properties: Map::new(),
            consoles: Vec::new(),
            sinks: Vec::new(),
            names: Vec::new(),
        }
    }
}

impl fmt::Debug for LoggerConfiguration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LoggerConfiguration")
            .field("minimum_level", &self.minimum_level)
            .field("overrides", &self.overrides)
            .field("properties", &self.properties)
            .field("sinks", &self.names)
            .finish()
    }
}

impl LoggerConfiguration {
    /// Empty configuration at `information` level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration read from the `Logging` section: levels, overrides, and
    /// the declared `write_to` sinks rendered as text in the section's locale.
    #[must_use]
    pub fn from_options(options: &LoggingOptions) -> Self {
        let locale = Locale::from_tag(&options.locale);
        let mut configuration =
            Self::new().minimum_level(options.minimum_level.as_level_filter());
        for entry in &options.overrides {
            configuration =
                configuration.override_level(&entry.target, entry.level.as_level_filter());
        }
        for kind in &options.write_to {
            configuration = match kind {
                LogSinkKind::Console => configuration
                    .write_to_console(ConsoleSink::stdout(OutputFormat::Text(locale.clone()))),
                LogSinkKind::Debug => configuration.write_to_console_if(
                    ConsoleSink::debug_enabled(),
                    ConsoleSink::debug(OutputFormat::Text(locale.clone())),
                ),
            };
        }
        configuration
    }

    /// Set the default minimum level.
    #[must_use]
    pub const fn minimum_level(mut self, level: LevelFilter) -> Self {
        self.minimum_level = level;
        self
    }

    /// Set the minimum level for targets starting with `target`.
    #[must_use]
    pub fn override_level(mut self, target: &str, level: LevelFilter) -> Self {
        self.overrides.push((target.to_string(), level));
        self
    }

    /// Attach a property to every event.
    #[must_use]
    pub fn enrich_with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Add a console-style sink.
    #[must_use]
    pub fn write_to_console(mut self, console: ConsoleSink) -> Self {
        self.names.push(console.name());
        self.consoles.push(console);
        self
    }

    /// Add a console-style sink when `condition` holds.
    #[must_use]
    pub fn write_to_console_if(self, condition: bool, console: ConsoleSink) -> Self {
        if condition {
            self.write_to_console(console)
        } else {
            self
        }
    }

    /// Add a record sink.
    #[must_use]
    pub fn write_to(mut self, sink: SharedSink) -> Self {
        self.names.push(sink.name());
        self.sinks.push(sink);
        self
    }

    /// Add several record sinks.
    #[must_use]
    pub fn write_to_all(self, sinks: impl IntoIterator<Item = SharedSink>) -> Self {
        sinks.into_iter().fold(self, Self::write_to)
    }

    /// Names of the configured sinks in registration order.
    #[must_use]
    pub fn sink_names(&self) -> Vec<&'static str> {
        self.names.clone()
    }

    /// Configured enrichment properties.
    #[must_use]
    pub const fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Freeze the configuration into a pipeline.
    #[must_use]
    pub fn create_pipeline(self) -> Pipeline {
        let filter = Targets::new()
            .with_default(self.minimum_level)
            .with_targets(self.overrides);
        let layers = self
            .consoles
            .iter()
            .map(|console| console.layer(&self.properties))
            .collect();
        Pipeline {
            filter,
            properties: self.properties,
            consoles: self.consoles,
            layers,
            sinks: self.sinks,
        }
    }
}

/// Active sink set with its level filter.
pub struct Pipeline {
    filter: Targets,
    properties: Map<String, Value>,
    consoles: Vec<ConsoleSink>,
    layers: Vec<ConsoleLayer>,
    sinks: Vec<SharedSink>,
}

impl Pipeline {
    /// Pipeline that accepts nothing, installed once the logger is closed.
    #[must_use]
    pub fn closed() -> Self {
        Self {
            filter: Targets::new().with_default(LevelFilter::OFF),
            properties: Map::new(),
            consoles: Vec::new(),
            layers: Vec::new(),
            sinks: Vec::new(),
        }
    }

    /// Flush the console streams.
    pub(crate) fn flush_consoles(&self) {
        for console in &self.consoles {
            console.flush();
        }
    }

    /// Flush the console streams, then every record sink.
    pub(crate) async fn flush(&self) {
        self.flush_consoles();
        for sink in &self.sinks {
            sink.flush().await;
        }
    }

    fn would_enable(&self, metadata: &Metadata<'_>) -> bool {
        !(self.layers.is_empty() && self.sinks.is_empty())
            && self.filter.would_enable(metadata.target(), metadata.level())
    }

    fn dispatch(&self, record: &LogRecord) {
        for sink in &self.sinks {
            if sink.accepts(record.level) {
                sink.emit(record);
            }
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Pipeline")
            .field("filter", &self.filter)
            .field("properties", &self.properties)
            .field(
                "sinks",
                &self
                    .consoles
                    .iter()
                    .map(ConsoleSink::name)
                    .chain(self.sinks.iter().map(|sink| sink.name()))
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Layer<Registry> for Pipeline {
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        // Filters change on reload, so every callsite is re-checked per event.
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, Registry>) -> bool {
        self.would_enable(metadata)
    }

    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, Registry>) {
        for layer in &self.layers {
            layer.on_new_span(attrs, id, ctx.clone());
        }
    }

    fn on_record(&self, span: &Id, values: &Record<'_>, ctx: Context<'_, Registry>) {
        for layer in &self.layers {
            layer.on_record(span, values, ctx.clone());
        }
    }

    fn on_enter(&self, id: &Id, ctx: Context<'_, Registry>) {
        for layer in &self.layers {
            layer.on_enter(id, ctx.clone());
        }
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, Registry>) {
        for layer in &self.layers {
            layer.on_exit(id, ctx.clone());
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, Registry>) {
        for layer in &self.layers {
            layer.on_close(id.clone(), ctx.clone());
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, Registry>) {
        if !self.would_enable(event.metadata()) {
            return;
        }
        for layer in &self.layers {
            layer.on_event(event, ctx.clone());
        }
        if !self.sinks.is_empty() {
            let record = LogRecord::from_event(event, &self.properties);
            self.dispatch(&record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::sink::capture::CaptureSink;
    use rokvi_config::{LevelOverride, LogLevel};
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture_with(configuration: LoggerConfiguration) -> CaptureSink {
        let capture = CaptureSink::new();
        let pipeline = configuration
            .write_to(Arc::new(capture.clone()))
            .create_pipeline();
        let subscriber = Registry::default().with(pipeline);
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "rokvi::noisy", "noisy debug");
            tracing::debug!(target: "rokvi::cars", "cars debug");
            tracing::info!(target: "rokvi::cars", "cars info");
            tracing::warn!(target: "hyper::proto", "hyper warn");
            tracing::info!(target: "hyper::proto", "hyper info");
        });
        capture
    }

    #[test]
    fn minimum_level_and_overrides_filter_by_target() {
        let capture = capture_with(
            LoggerConfiguration::new()
                .minimum_level(LevelFilter::DEBUG)
                .override_level("hyper", LevelFilter::WARN)
                .override_level("rokvi::noisy", LevelFilter::INFO),
        );
        assert_eq!(
            capture.messages(),
            vec!["cars debug", "cars info", "hyper warn"]
        );
    }

    #[test]
    fn enrichment_properties_reach_every_record() {
        let capture = capture_with(
            LoggerConfiguration::new()
                .enrich_with_property("Application", "Rokvi")
                .enrich_with_property("Environment", "Test"),
        );
        let records = capture.records();
        assert!(!records.is_empty());
        assert!(records.iter().all(|record| {
            record.str_value("Application") == Some("Rokvi")
                && record.str_value("Environment") == Some("Test")
        }));
    }

    #[test]
    fn options_translate_levels_and_sinks() {
        let options = LoggingOptions {
            minimum_level: LogLevel::Warning,
            overrides: vec![LevelOverride {
                target: "rokvi".to_string(),
                level: LogLevel::Verbose,
            }],
            write_to: vec![LogSinkKind::Console, LogSinkKind::Debug],
            locale: "is-IS".to_string(),
        };
        let configuration = LoggerConfiguration::from_options(&options);
        let expected = if ConsoleSink::debug_enabled() {
            vec!["console", "debug"]
        } else {
            vec!["console"]
        };
        assert_eq!(configuration.sink_names(), expected);

        let capture = capture_with(
            LoggerConfiguration::from_options(&LoggingOptions {
                write_to: Vec::new(),
                ..options
            }),
        );
        assert_eq!(
            capture.messages(),
            vec!["noisy debug", "cars debug", "cars info", "hyper warn"]
        );
    }

    #[test]
    fn console_sinks_keep_names_in_registration_order() {
        let capture = CaptureSink::new();
        let configuration = LoggerConfiguration::new()
            .write_to(Arc::new(capture))
            .write_to_console(ConsoleSink::stdout(OutputFormat::CompactJson))
            .write_to_console_if(false, ConsoleSink::debug(OutputFormat::CompactJson));
        assert_eq!(configuration.sink_names(), vec!["capture", "console"]);
    }

    #[test]
    fn console_only_pipelines_enable_events() {
        let pipeline = LoggerConfiguration::new()
            .write_to_console(ConsoleSink::test_output(Locale::default()))
            .create_pipeline();
        tracing::subscriber::with_default(Registry::default().with(pipeline), || {
            assert!(tracing::enabled!(Level::INFO));
            assert!(!tracing::enabled!(Level::DEBUG));
        });

        tracing::subscriber::with_default(Registry::default().with(Pipeline::closed()), || {
            assert!(!tracing::enabled!(Level::ERROR));
        });
    }
}
