//! Event formatters for console-style sinks.
//!
//! # Design
//! - Console sinks are `tracing_subscriber::fmt` layers; this module provides
//!   their [`FormatEvent`] and [`FormatFields`] implementations.
//! - Text lines follow `[HH:MM:SS LVL] message key=value`, with fractional
//!   numbers rendered in the configured locale.
//! - Compact JSON lines use the `@t`/`@m`/`@l` envelope; the level is omitted
//!   for information events and enrichment properties sit beside the fields.

use std::fmt;

use chrono::SecondsFormat;
use serde_json::{Map, Value};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::field::RecordFields;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{ChronoLocal, FormatTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::locale::Locale;
use crate::record::{LogRecord, RecordVisitor, level_abbreviation, level_name};

/// Property name carrying the event target in compact JSON.
pub const SOURCE_CONTEXT: &str = "SourceContext";

const TEXT_TIME_FORMAT: &str = "%H:%M:%S";

/// Rendering applied by a console-style sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text in the given locale.
    Text(Locale),
    /// One compact JSON object per line.
    CompactJson,
}

/// Field formatter writing `message key=value` with locale-aware numbers.
#[derive(Debug, Clone)]
pub struct LocaleFields {
    locale: Locale,
}

impl LocaleFields {
    /// Formatter for `locale`.
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        Self { locale }
    }
}

impl<'writer> FormatFields<'writer> for LocaleFields {
    fn format_fields<R: RecordFields>(&self, mut writer: Writer<'writer>, fields: R) -> fmt::Result {
        let mut visitor = RecordVisitor::default();
        fields.record(&mut visitor);
        let mut separate = false;
        if let Some(message) = &visitor.message {
            writer.write_str(message)?;
            separate = true;
        }
        for (key, value) in &visitor.fields {
            if separate {
                writer.write_char(' ')?;
            }
            write!(writer, "{key}={}", text_value(value, &self.locale))?;
            separate = true;
        }
        Ok(())
    }
}

fn text_value(value: &Value, locale: &Locale) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) if number.is_f64() => number
            .as_f64()
            .map_or_else(|| number.to_string(), |float| locale.format_f64(float)),
        other => other.to_string(),
    }
}

/// Event formatter for text lines; fields go through the layer's field
/// formatter.
#[derive(Debug, Clone)]
pub struct TextFormat {
    timer: ChronoLocal,
}

impl Default for TextFormat {
    fn default() -> Self {
        Self {
            timer: ChronoLocal::new(TEXT_TIME_FORMAT.to_string()),
        }
    }
}

impl<S, N> FormatEvent<S, N> for TextFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        writer.write_char('[')?;
        self.timer.format_time(&mut writer)?;
        write!(
            writer,
            " {}] ",
            level_abbreviation(*event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Event formatter for compact JSON lines carrying enrichment properties.
#[derive(Debug, Clone, Default)]
pub struct CompactJsonFormat {
    properties: Map<String, Value>,
}

impl CompactJsonFormat {
    /// Formatter attaching `properties` to every line.
    #[must_use]
    pub const fn new(properties: Map<String, Value>) -> Self {
        Self { properties }
    }
}

impl<S, N> FormatEvent<S, N> for CompactJsonFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let record = LogRecord::from_event(event, &self.properties);
        writeln!(writer, "{}", compact_json(&record))
    }
}

/// Build the compact JSON object for `record`.
#[must_use]
pub fn compact_json(record: &LogRecord) -> Value {
    let mut object = Map::new();
    object.insert(
        "@t".to_string(),
        Value::from(record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
    );
    object.insert("@m".to_string(), Value::from(record.message.clone()));
    if record.level != Level::INFO {
        object.insert("@l".to_string(), Value::from(level_name(record.level)));
    }
    for (key, value) in record.properties.iter().chain(record.fields.iter()) {
        object.insert(key.clone(), value.clone());
    }
    object.insert(
        SOURCE_CONTEXT.to_string(),
        Value::from(record.target.clone()),
    );
    Value::Object(object)
}
