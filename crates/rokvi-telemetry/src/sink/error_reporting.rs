//! External error-reporting sink.
//!
//! # Design
//! - The DSN (`https://key@host/project`) is parsed once into a store endpoint
//!   and an auth header; the key never appears in request URLs.
//! - Only warning and error events are reported.

use std::sync::Arc;

use reqwest::Url;
use serde_json::{Value, json};
use tracing::Level;
use uuid::Uuid;

use super::shipping::{HttpTransport, ShippingOptions, ShippingSink, Transport, extra_values};
use crate::error::{TelemetryError, TelemetryResult};
use crate::record::LogRecord;

/// Header carrying client authentication.
pub const AUTH_HEADER: &str = "x-sentry-auth";
const PROTOCOL_VERSION: u8 = 7;

/// Parsed error-reporting DSN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    public_key: String,
    store_endpoint: String,
    project: String,
}

impl Dsn {
    /// Parse `scheme://key@host[:port]/project`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidDsn`] when any part is missing.
    pub fn parse(value: &str) -> TelemetryResult<Self> {
        let url = Url::parse(value.trim())
            .map_err(|_| TelemetryError::InvalidDsn { reason: "not_a_url" })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TelemetryError::InvalidDsn {
                reason: "unsupported_scheme",
            });
        }
        let public_key = url.username();
        if public_key.is_empty() {
            return Err(TelemetryError::InvalidDsn {
                reason: "missing_key",
            });
        }
        let host = url.host_str().ok_or(TelemetryError::InvalidDsn {
            reason: "missing_host",
        })?;
        let project = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .ok_or(TelemetryError::InvalidDsn {
                reason: "missing_project",
            })?;
        let port = url.port().map(|port| format!(":{port}")).unwrap_or_default();
        Ok(Self {
            public_key: public_key.to_string(),
            store_endpoint: format!("{}://{host}{port}/api/{project}/store/", url.scheme()),
            project: project.to_string(),
        })
    }

    /// Endpoint receiving event documents.
    #[must_use]
    pub fn store_endpoint(&self) -> &str {
        &self.store_endpoint
    }

    /// Project identifier.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Value of the authentication header.
    #[must_use]
    pub fn auth_header(&self) -> String {
        format!(
            "Sentry sentry_version={PROTOCOL_VERSION}, sentry_client=rokvi/{}, sentry_key={}",
            env!("CARGO_PKG_VERSION"),
            self.public_key
        )
    }
}

/// Event document posted for a single record.
pub(crate) fn event_document(record: &LogRecord) -> Value {
    let level = if record.level == Level::ERROR {
        "error"
    } else {
        "warning"
    };
    json!({
        "event_id": Uuid::new_v4().simple().to_string(),
        "timestamp": record.timestamp.to_rfc3339(),
        "platform": "other",
        "level": level,
        "logger": record.target,
        "message": record.message,
        "extra": extra_values(record),
    })
}

/// Error-reporting sink over an explicit transport.
///
/// # Errors
///
/// Returns an error when no Tokio runtime is available.
pub fn error_reporting_sink_with(transport: Arc<dyn Transport>) -> TelemetryResult<ShippingSink> {
    ShippingSink::spawn(
        "error_reporting",
        Level::WARN,
        transport,
        ShippingOptions::default(),
    )
}

/// Error-reporting sink posting to the DSN's store endpoint.
///
/// # Errors
///
/// Returns an error when the DSN is malformed, the HTTP client cannot be built,
/// or no Tokio runtime is available.
pub fn error_reporting_sink(dsn: &str) -> TelemetryResult<ShippingSink> {
    let dsn = Dsn::parse(dsn)?;
    let transport = HttpTransport::error_events(
        "error_reporting",
        dsn.store_endpoint().to_string(),
        vec![(AUTH_HEADER, dsn.auth_header())],
    )?;
    error_reporting_sink_with(Arc::new(transport))
}
