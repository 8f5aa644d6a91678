//! # Design
//!
//! - Centralize host-level errors for bootstrap and orchestration.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites; the bootstrap
//!   sequence logs the terminal failure once.

use std::error::Error;

use thiserror::Error;

/// Result alias for host operations.
pub type AppResult<T> = Result<T, AppError>;

/// Host-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Command-line arguments were rejected.
    #[error("invalid command-line arguments")]
    Arguments {
        /// Source parser error.
        source: clap::Error,
    },
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: rokvi_config::ConfigError,
    },
    /// Web transport operations failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source web transport error.
        source: rokvi_api::ApiServerError,
    },
    /// Logging operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: rokvi_telemetry::TelemetryError,
    },
    /// Required dependency was missing from the service collection.
    #[error("missing dependency")]
    MissingDependency {
        /// Name of the missing dependency.
        name: &'static str,
    },
    /// Startup collaborator failed while configuring the host.
    #[error("startup configuration failed")]
    Startup {
        /// Operation identifier.
        operation: &'static str,
        /// Source error raised by the collaborator.
        source: Box<dyn Error + Send + Sync>,
    },
    /// A host task panicked or was cancelled.
    #[error("host task failed")]
    Task {
        /// Operation identifier.
        operation: &'static str,
        /// Source join error.
        source: tokio::task::JoinError,
    },
    /// Graceful shutdown did not finish in time.
    #[error("graceful shutdown timed out")]
    ShutdownTimeout {
        /// Configured timeout in seconds.
        seconds: u64,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: rokvi_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn api_server(
        operation: &'static str,
        source: rokvi_api::ApiServerError,
    ) -> Self {
        Self::ApiServer { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: rokvi_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn task(operation: &'static str, source: tokio::task::JoinError) -> Self {
        Self::Task { operation, source }
    }

    /// Wrap an arbitrary collaborator failure.
    pub fn startup(
        operation: &'static str,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Startup {
            operation,
            source: source.into(),
        }
    }

    /// Render the error with its full source chain.
    #[must_use]
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut current = self.source();
        while let Some(source) = current {
            rendered.push_str(": ");
            rendered.push_str(&source.to_string());
            current = source.source();
        }
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn app_error_helpers_build_variants() {
        let config = AppError::config(
            "config.load",
            rokvi_config::ConfigError::InvalidEnvironment {
                value: "qa".to_string(),
            },
        );
        assert!(matches!(config, AppError::Config { .. }));

        let api = AppError::api_server(
            "api.serve",
            rokvi_api::ApiServerError::Serve {
                source: io::Error::other("io"),
            },
        );
        assert!(matches!(api, AppError::ApiServer { .. }));

        let telemetry = AppError::telemetry(
            "telemetry.reload",
            rokvi_telemetry::TelemetryError::InvalidDsn {
                reason: "missing key",
            },
        );
        assert!(matches!(telemetry, AppError::Telemetry { .. }));

        let startup = AppError::startup("startup.configure", io::Error::other("boom"));
        assert!(matches!(startup, AppError::Startup { .. }));
    }

    #[test]
    fn chain_includes_every_source() {
        let err = AppError::api_server(
            "api.bind",
            rokvi_api::ApiServerError::Bind {
                addr: "127.0.0.1:5000".to_string(),
                source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
            },
        );
        assert_eq!(
            err.chain(),
            "api server operation failed: failed to bind web transport listener: address in use"
        );
        assert_eq!(
            AppError::ShutdownTimeout { seconds: 30 }.chain(),
            "graceful shutdown timed out"
        );
    }
}
