//! Background delivery for remote sinks.
//!
//! # Design
//! - `emit` enqueues into a bounded channel and never waits; a full queue drops
//!   the record and counts it.
//! - A single worker task batches records and hands them to a [`Transport`].
//! - Delivery failures are reported on standard error, never through `tracing`,
//!   so a failing sink cannot feed itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::Level;

use super::LogSink;
use crate::error::{TelemetryError, TelemetryResult};
use crate::record::LogRecord;

const DEFAULT_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_BATCH_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers batches of records to a remote endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver a non-empty batch.
    async fn send(&self, batch: &[LogRecord]) -> TelemetryResult<()>;
}

/// Request body layout for [`HttpTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    /// Newline-delimited compact JSON, one request per batch.
    CompactJsonLines,
    /// One error event document per record.
    ErrorEvents,
}

/// HTTP transport built on `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    sink: &'static str,
    client: Client,
    endpoint: String,
    headers: Vec<(&'static str, String)>,
    payload: Payload,
}

impl HttpTransport {
    fn new(
        sink: &'static str,
        endpoint: String,
        headers: Vec<(&'static str, String)>,
        payload: Payload,
    ) -> TelemetryResult<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|source| TelemetryError::HttpClient { source })?;
        Ok(Self {
            sink,
            client,
            endpoint,
            headers,
            payload,
        })
    }

    /// Transport posting newline-delimited compact JSON batches.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::HttpClient`] when the client cannot be built.
    pub fn compact_json_lines(
        sink: &'static str,
        endpoint: impl Into<String>,
        headers: Vec<(&'static str, String)>,
    ) -> TelemetryResult<Self> {
        Self::new(sink, endpoint.into(), headers, Payload::CompactJsonLines)
    }

    /// Transport posting one error event document per record.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::HttpClient`] when the client cannot be built.
    pub fn error_events(
        sink: &'static str,
        endpoint: impl Into<String>,
        headers: Vec<(&'static str, String)>,
    ) -> TelemetryResult<Self> {
        Self::new(sink, endpoint.into(), headers, Payload::ErrorEvents)
    }

    async fn post(&self, content_type: &'static str, body: String) -> TelemetryResult<()> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);
        for (name, value) in &self.headers {
            request = request.header(*name, value.as_str());
        }
        let response = request
            .send()
            .await
            .map_err(|source| TelemetryError::Delivery {
                sink: self.sink,
                source,
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TelemetryError::Rejected {
                sink: self.sink,
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, batch: &[LogRecord]) -> TelemetryResult<()> {
        match self.payload {
            Payload::CompactJsonLines => {
                let mut body = String::new();
                for record in batch {
                    body.push_str(&crate::format::compact_json(record).to_string());
                    body.push('\n');
                }
                self.post("application/vnd.serilog.clef", body).await
            }
            Payload::ErrorEvents => {
                for record in batch {
                    let document = super::error_reporting::event_document(record);
                    let body = serde_json::to_string(&document)
                        .map_err(|source| TelemetryError::Encode { source })?;
                    self.post("application/json", body).await?;
                }
                Ok(())
            }
        }
    }
}

enum Command {
    Record(LogRecord),
    Flush(oneshot::Sender<()>),
}

/// Tuning for a [`ShippingSink`].
#[derive(Debug, Clone, Copy)]
pub struct ShippingOptions {
    /// Records buffered before new ones are dropped.
    pub queue_capacity: usize,
    /// Maximum records per transport call.
    pub batch_size: usize,
    /// Longest time a partial batch waits before delivery.
    pub batch_interval: Duration,
    /// Longest time `flush` waits for the worker.
    pub flush_timeout: Duration,
}

impl Default for ShippingOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_interval: DEFAULT_BATCH_INTERVAL,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }
}

/// Sink that ships records to a [`Transport`] from a background task.
pub struct ShippingSink {
    name: &'static str,
    minimum_level: Level,
    sender: mpsc::Sender<Command>,
    dropped: Arc<AtomicU64>,
    flush_timeout: Duration,
}

impl ShippingSink {
    /// Spawn the delivery worker on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::RuntimeUnavailable`] outside a runtime.
    pub fn spawn(
        name: &'static str,
        minimum_level: Level,
        transport: Arc<dyn Transport>,
        options: ShippingOptions,
    ) -> TelemetryResult<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| TelemetryError::RuntimeUnavailable { sink: name })?;
        let (sender, receiver) = mpsc::channel(options.queue_capacity.max(1));
        runtime.spawn(deliver(name, receiver, transport, options));
        Ok(Self {
            name,
            minimum_level,
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
            flush_timeout: options.flush_timeout,
        })
    }

    /// Records dropped because the queue was full or the worker had stopped.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LogSink for ShippingSink {
    fn name(&self) -> &'static str {
        self.name
    }

    fn minimum_level(&self) -> Level {
        self.minimum_level
    }

    fn emit(&self, record: &LogRecord) {
        if self.sender.try_send(Command::Record(record.clone())).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(Command::Flush(ack)).await.is_err() {
            return;
        }
        if tokio::time::timeout(self.flush_timeout, done).await.is_err() {
            eprintln!("rokvi-telemetry: {} flush timed out", self.name);
        }
        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            eprintln!("rokvi-telemetry: {} dropped {dropped} records", self.name);
        }
    }
}

async fn deliver(
    name: &'static str,
    mut receiver: mpsc::Receiver<Command>,
    transport: Arc<dyn Transport>,
    options: ShippingOptions,
) {
    let batch_size = options.batch_size.max(1);
    let mut batch = Vec::with_capacity(batch_size);
    let mut ticker = tokio::time::interval(options.batch_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = receiver.recv() => match command {
                Some(Command::Record(record)) => {
                    batch.push(record);
                    if batch.len() >= batch_size {
                        ship(name, transport.as_ref(), &mut batch).await;
                    }
                }
                Some(Command::Flush(ack)) => {
                    ship(name, transport.as_ref(), &mut batch).await;
                    let _ = ack.send(());
                }
                None => {
                    ship(name, transport.as_ref(), &mut batch).await;
                    break;
                }
            },
            _ = ticker.tick() => ship(name, transport.as_ref(), &mut batch).await,
        }
    }
}

async fn ship(name: &'static str, transport: &dyn Transport, batch: &mut Vec<LogRecord>) {
    if batch.is_empty() {
        return;
    }
    if let Err(err) = transport.send(batch).await {
        eprintln!("rokvi-telemetry: {name} delivery failed: {err}");
    }
    batch.clear();
}

/// JSON value for a record field or property, as shipped remotely.
pub(crate) fn extra_values(record: &LogRecord) -> serde_json::Map<String, Value> {
    record
        .properties
        .iter()
        .chain(record.fields.iter())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubTransport {
        batches: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, batch: &[LogRecord]) -> TelemetryResult<()> {
            if let Ok(mut batches) = self.batches.lock() {
                batches.push(batch.iter().map(|record| record.message.clone()).collect());
            }
            Ok(())
        }
    }

    fn options(batch_size: usize, queue_capacity: usize) -> ShippingOptions {
        ShippingOptions {
            queue_capacity,
            batch_size,
            batch_interval: Duration::from_secs(3600),
            flush_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn flush_delivers_pending_records_in_batches() -> Result<(), String> {
        let transport = Arc::new(StubTransport::default());
        let sink = ShippingSink::spawn("test", Level::TRACE, transport.clone(), options(2, 16))
            .map_err(|err| err.to_string())?;
        for message in ["a", "b", "c"] {
            sink.emit(&LogRecord::new(Level::INFO, "rokvi", message));
        }
        sink.flush().await;

        let batches = transport.batches.lock().map_err(|err| err.to_string())?;
        assert_eq!(
            *batches,
            vec![vec!["a".to_string(), "b".to_string()], vec!["c".to_string()]]
        );
        assert_eq!(sink.dropped(), 0);
        Ok(())
    }

    #[tokio::test(flavor = "current_thread")]
    async fn full_queue_drops_records() -> Result<(), String> {
        let transport = Arc::new(StubTransport::default());
        let sink = ShippingSink::spawn("test", Level::TRACE, transport, options(100, 2))
            .map_err(|err| err.to_string())?;
        for message in ["a", "b", "c", "d"] {
            sink.emit(&LogRecord::new(Level::INFO, "rokvi", message));
        }
        assert_eq!(sink.dropped(), 2);
        Ok(())
    }

    #[test]
    fn spawning_outside_a_runtime_fails() {
        let result = ShippingSink::spawn(
            "test",
            Level::TRACE,
            Arc::new(StubTransport::default()),
            ShippingOptions::default(),
        );
        assert!(matches!(
            result,
            Err(TelemetryError::RuntimeUnavailable { sink: "test" })
        ));
    }

    #[test]
    fn extra_values_merge_properties_and_fields() {
        let mut record = LogRecord::new(Level::ERROR, "rokvi", "boom").with_field("code", 7);
        record
            .properties
            .insert("Application".to_string(), Value::from("Rokvi"));
        let extra = extra_values(&record);
        assert_eq!(extra.get("code"), Some(&Value::from(7)));
        assert_eq!(extra.get("Application"), Some(&Value::from("Rokvi")));
    }
}
