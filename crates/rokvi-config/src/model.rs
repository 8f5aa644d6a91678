//! Typed application options.
//!
//! # Design
//! - Pure data carriers bound once from the layered sources and shared read-only.
//! - Every section defaults so partially populated sources still bind.
//! - Unknown keys are rejected so a misspelt setting fails at startup.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::defaults::{
    DEFAULT_BIND, DEFAULT_ERROR_REPORTING_DSN, DEFAULT_LOG_LOCALE, DEFAULT_MAX_REQUEST_BODY_BYTES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
use crate::error::ConfigError;

/// Aggregate of every configuration section consumed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ApplicationOptions {
    /// Web transport tuning (`Server` section).
    pub server: ServerOptions,
    /// Logger minimum levels and configured sinks (`Logging` section).
    pub logging: LoggingOptions,
    /// Production telemetry backend (`Telemetry` section).
    pub telemetry: TelemetryOptions,
    /// External error-reporting service (`ErrorReporting` section).
    pub error_reporting: ErrorReportingOptions,
}

/// Web transport tuning bound from the `Server` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerOptions {
    /// Socket address the listener binds to.
    pub bind: String,
    /// Emit the `server` identification header on responses.
    pub add_server_header: bool,
    /// Per-request timeout in seconds.
    pub request_timeout_seconds: u64,
    /// Maximum accepted request body size.
    pub max_request_body_bytes: usize,
    /// Graceful shutdown window in seconds.
    pub shutdown_timeout_seconds: u64,
    /// Hot reload of this section; must stay `false`.
    pub reload_on_change: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            add_server_header: false,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_request_body_bytes: DEFAULT_MAX_REQUEST_BODY_BYTES,
            shutdown_timeout_seconds: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            reload_on_change: false,
        }
    }
}

impl ServerOptions {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Graceful shutdown window as a [`Duration`].
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

/// Logger configuration bound from the `Logging` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingOptions {
    /// Default minimum level.
    pub minimum_level: LogLevel,
    /// Per-target minimum level overrides, e.g. `hyper: warning`.
    pub overrides: Vec<LevelOverride>,
    /// Sinks declared by configuration.
    pub write_to: Vec<LogSinkKind>,
    /// Locale tag used for text rendering.
    pub locale: String,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            minimum_level: LogLevel::Information,
            overrides: Vec::new(),
            write_to: vec![LogSinkKind::Console, LogSinkKind::Debug],
            locale: DEFAULT_LOG_LOCALE.to_string(),
        }
    }
}

/// Minimum level applied to a single event target prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelOverride {
    /// Target prefix (module path) the override applies to.
    pub target: String,
    /// Minimum level for the target.
    pub level: LogLevel,
}

/// Log severity names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    /// Everything, including trace output.
    Verbose,
    /// Diagnostic output.
    Debug,
    /// Normal operational events.
    Information,
    /// Degraded but recoverable conditions.
    Warning,
    /// Failures.
    Error,
}

impl LogLevel {
    /// Canonical configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verbose => "Verbose",
            Self::Debug => "Debug",
            Self::Information => "Information",
            Self::Warning => "Warning",
            Self::Error => "Error",
        }
    }

    /// Equivalent `tracing` filter.
    #[must_use]
    pub const fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Verbose => LevelFilter::TRACE,
            Self::Debug => LevelFilter::DEBUG,
            Self::Information => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error => LevelFilter::ERROR,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "verbose" | "trace" => Ok(Self::Verbose),
            "debug" => Ok(Self::Debug),
            "information" | "info" => Ok(Self::Information),
            "warning" | "warn" => Ok(Self::Warning),
            "error" | "fatal" => Ok(Self::Error),
            _ => Err(ConfigError::InvalidLogLevel {
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, ConfigError> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(value: LogLevel) -> Self {
        value.as_str().to_string()
    }
}

/// Sinks that configuration may declare by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogSinkKind {
    /// Text lines on standard output.
    Console,
    /// Text lines on standard error, debug builds only.
    Debug,
}

impl FromStr for LogSinkKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "debug" => Ok(Self::Debug),
            _ => Err(ConfigError::InvalidLogSink {
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for LogSinkKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, ConfigError> {
        value.parse()
    }
}

impl From<LogSinkKind> for String {
    fn from(value: LogSinkKind) -> Self {
        match value {
            LogSinkKind::Console => "Console".to_string(),
            LogSinkKind::Debug => "Debug".to_string(),
        }
    }
}

/// Production telemetry backend bound from the `Telemetry` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryOptions {
    /// Ingestion endpoint receiving batches of compact JSON events.
    pub ingestion_endpoint: String,
    /// Key identifying this application to the telemetry backend.
    pub instrumentation_key: String,
}

impl TelemetryOptions {
    /// Returns `true` when an ingestion endpoint is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.ingestion_endpoint.trim().is_empty()
    }
}

/// External error-reporting service bound from the `ErrorReporting` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorReportingOptions {
    /// Client key and project endpoint (`https://key@host/project`).
    pub dsn: String,
}

impl Default for ErrorReportingOptions {
    fn default() -> Self {
        Self {
            dsn: DEFAULT_ERROR_REPORTING_DSN.to_string(),
        }
    }
}
