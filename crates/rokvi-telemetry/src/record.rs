//! Captured log events.
//!
//! # Design
//! - Events are captured once per pipeline into an owned [`LogRecord`] so every
//!   sink sees identical data and shipping sinks can move records across tasks.
//! - Field values keep their JSON type for compact JSON rendering.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::Level;
use tracing::field::{Field, Visit};

const MESSAGE_FIELD: &str = "message";

/// Owned snapshot of a single `tracing` event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Capture time.
    pub timestamp: DateTime<Utc>,
    /// Event severity.
    pub level: Level,
    /// Event target (module path unless overridden).
    pub target: String,
    /// Rendered message.
    pub message: String,
    /// Structured fields recorded on the event.
    pub fields: Map<String, Value>,
    /// Enrichment properties attached by the pipeline.
    pub properties: Map<String, Value>,
}

impl LogRecord {
    /// Build a record directly, mainly for sinks and tests.
    #[must_use]
    pub fn new(level: Level, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            target: target.into(),
            message: message.into(),
            fields: Map::new(),
            properties: Map::new(),
        }
    }

    /// Capture a `tracing` event with the given enrichment properties.
    #[must_use]
    pub fn from_event(event: &tracing::Event<'_>, properties: &Map<String, Value>) -> Self {
        let metadata = event.metadata();
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        Self {
            timestamp: Utc::now(),
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
            properties: properties.clone(),
        }
    }

    /// Attach a structured field.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Look up a field, falling back to enrichment properties.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).or_else(|| self.properties.get(name))
    }

    /// Returns the named field as a string slice when it is textual.
    #[must_use]
    pub fn str_value(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }
}

/// Collects an event's message and typed fields.
#[derive(Default)]
pub(crate) struct RecordVisitor {
    pub(crate) message: Option<String>,
    pub(crate) fields: Map<String, Value>,
}

impl RecordVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == MESSAGE_FIELD {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for RecordVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{value:?}")));
    }
}

/// Three-letter abbreviation used by the text format.
#[must_use]
pub fn level_abbreviation(level: Level) -> &'static str {
    match level {
        Level::TRACE => "VRB",
        Level::DEBUG => "DBG",
        Level::INFO => "INF",
        Level::WARN => "WRN",
        _ => "ERR",
    }
}

/// Level name used by compact JSON and remote sinks.
#[must_use]
pub fn level_name(level: Level) -> &'static str {
    match level {
        Level::TRACE => "Verbose",
        Level::DEBUG => "Debug",
        Level::INFO => "Information",
        Level::WARN => "Warning",
        _ => "Error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing::Subscriber;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::{Layer, Registry};

    struct Recorder(Arc<Mutex<Vec<LogRecord>>>);

    impl<S: Subscriber> Layer<S> for Recorder {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut properties = Map::new();
            properties.insert("Application".to_string(), Value::from("Rokvi"));
            if let Ok(mut records) = self.0.lock() {
                records.push(LogRecord::from_event(event, &properties));
            }
        }
    }

    #[test]
    fn visitor_captures_message_and_typed_fields() -> Result<(), String> {
        let records = Arc::new(Mutex::new(Vec::new()));
        let subscriber = Registry::default().with(Recorder(Arc::clone(&records)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(
                target: "rokvi::cars",
                count = 3_u64,
                ratio = 0.5_f64,
                ok = true,
                name = "volvo",
                "cars listed"
            );
        });

        let records = records.lock().map_err(|err| err.to_string())?;
        let record = records.first().ok_or("no record captured")?;
        assert_eq!(record.message, "cars listed");
        assert_eq!(record.level, Level::WARN);
        assert_eq!(record.target, "rokvi::cars");
        assert_eq!(record.fields.get("count"), Some(&Value::from(3_u64)));
        assert_eq!(record.fields.get("ratio"), Some(&Value::from(0.5_f64)));
        assert_eq!(record.fields.get("ok"), Some(&Value::from(true)));
        assert_eq!(record.str_value("name"), Some("volvo"));
        assert_eq!(record.str_value("Application"), Some("Rokvi"));
        assert!(!record.fields.contains_key("message"));
        Ok(())
    }

    #[test]
    fn level_labels() {
        assert_eq!(level_abbreviation(Level::INFO), "INF");
        assert_eq!(level_abbreviation(Level::TRACE), "VRB");
        assert_eq!(level_name(Level::WARN), "Warning");
    }
}
