use anyhow::Result;
use httpmock::MockServer;
use httpmock::prelude::*;
use rokvi_telemetry::sink::error_reporting::AUTH_HEADER;
use rokvi_telemetry::sink::telemetry::INSTRUMENTATION_KEY_HEADER;
use rokvi_telemetry::{
    HttpTransport, LogRecord, LogSink, LoggerConfiguration, LoggingHandle, TelemetryConfiguration,
    TelemetryError, Transport, error_reporting_sink, telemetry_sink,
};
use std::sync::Arc;
use tracing::Level;

#[tokio::test]
async fn telemetry_sink_posts_compact_json_batches() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/ingest")
            .header(INSTRUMENTATION_KEY_HEADER, "key-1")
            .body_includes("\"@m\":\"car listed\"")
            .body_includes("\"Application\":\"Rokvi\"");
        then.status(200);
    });

    let sink = telemetry_sink(&TelemetryConfiguration {
        ingestion_endpoint: server.url("/ingest"),
        instrumentation_key: "key-1".to_string(),
    })?;
    let mut record = LogRecord::new(Level::INFO, "rokvi_api", "car listed");
    record
        .properties
        .insert("Application".to_string(), "Rokvi".into());
    sink.emit(&record);
    sink.flush().await;

    mock.assert();
    Ok(())
}

#[tokio::test]
async fn error_reporting_receives_only_warnings_and_errors() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/42/store/")
            .header_exists(AUTH_HEADER)
            .body_includes("\"message\":\"startup failed\"");
        then.status(200);
    });

    let dsn = format!("http://public@{}/42", server.address());
    let sink = Arc::new(error_reporting_sink(&dsn)?);
    let logging = LoggingHandle::new(LoggerConfiguration::new().write_to(sink));
    {
        let _guard = logging.set_default();
        tracing::info!("routine event");
        tracing::error!("startup failed");
    }
    assert!(logging.close_and_flush().await);

    mock.assert_calls(1);
    Ok(())
}

#[tokio::test]
async fn rejected_batches_surface_the_status() -> Result<()> {
    let server = MockServer::start_async().await;
    let _mock = server.mock(|when, then| {
        when.method(POST).path("/ingest");
        then.status(503);
    });

    let transport = HttpTransport::compact_json_lines("telemetry", server.url("/ingest"), Vec::new())?;
    let result = transport
        .send(&[LogRecord::new(Level::INFO, "rokvi", "dropped")])
        .await;

    assert!(matches!(
        result,
        Err(TelemetryError::Rejected {
            sink: "telemetry",
            status: 503
        })
    ));
    Ok(())
}
