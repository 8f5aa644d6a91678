//! Error types for logging operations.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result alias for logging operations.
pub type TelemetryResult<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while installing, reloading, or delivering logs.
#[derive(Debug)]
pub enum TelemetryError {
    /// Installing the process-wide dispatcher failed.
    SubscriberInstall {
        /// Underlying dispatcher error.
        source: tracing::dispatcher::SetGlobalDefaultError,
    },
    /// Swapping the active pipeline failed.
    Reload {
        /// Underlying reload error.
        source: tracing_subscriber::reload::Error,
    },
    /// The error-reporting DSN could not be parsed.
    InvalidDsn {
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A shipping sink was created outside a Tokio runtime.
    RuntimeUnavailable {
        /// Sink that needed the runtime.
        sink: &'static str,
    },
    /// Building the HTTP client failed.
    HttpClient {
        /// Underlying client error.
        source: reqwest::Error,
    },
    /// Sending a batch failed before a response arrived.
    Delivery {
        /// Sink whose batch failed.
        sink: &'static str,
        /// Underlying request error.
        source: reqwest::Error,
    },
    /// The remote endpoint rejected a batch.
    Rejected {
        /// Sink whose batch was rejected.
        sink: &'static str,
        /// HTTP status returned by the endpoint.
        status: u16,
    },
    /// Encoding a batch failed.
    Encode {
        /// Underlying serde error.
        source: serde_json::Error,
    },
}

impl Display for TelemetryError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriberInstall { .. } => {
                formatter.write_str("failed to install logging dispatcher")
            }
            Self::Reload { .. } => formatter.write_str("failed to reload logging pipeline"),
            Self::InvalidDsn { .. } => formatter.write_str("invalid error reporting dsn"),
            Self::RuntimeUnavailable { .. } => {
                formatter.write_str("log sink requires a tokio runtime")
            }
            Self::HttpClient { .. } => formatter.write_str("failed to build http client"),
            Self::Delivery { .. } => formatter.write_str("failed to deliver log batch"),
            Self::Rejected { .. } => formatter.write_str("log batch rejected by endpoint"),
            Self::Encode { .. } => formatter.write_str("failed to encode log batch"),
        }
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SubscriberInstall { source } => Some(source),
            Self::Reload { source } => Some(source),
            Self::HttpClient { source } | Self::Delivery { source, .. } => Some(source),
            Self::Encode { source } => Some(source),
            Self::InvalidDsn { .. } | Self::RuntimeUnavailable { .. } | Self::Rejected { .. } => {
                None
            }
        }
    }
}
