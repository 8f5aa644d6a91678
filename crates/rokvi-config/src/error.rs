//! Error types for configuration operations.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment name was not recognised.
    #[error("invalid environment name")]
    InvalidEnvironment {
        /// Environment name provided by host configuration.
        value: String,
    },
    /// Log level name was not recognised.
    #[error("invalid log level")]
    InvalidLogLevel {
        /// Level name provided by configuration.
        value: String,
    },
    /// Sink name was not recognised.
    #[error("invalid log sink")]
    InvalidLogSink {
        /// Sink name provided by configuration.
        value: String,
    },
    /// Command-line override was not in `key=value` form.
    #[error("invalid configuration override")]
    InvalidOverride {
        /// Raw override argument.
        value: String,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section that failed validation.
        section: &'static str,
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Content root could not be resolved.
    #[error("content root unavailable")]
    ContentRoot {
        /// Path attempted, when known.
        path: Option<PathBuf>,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Assembling or binding the layered sources failed.
    #[error("configuration source failed")]
    Source {
        /// Operation identifier.
        operation: &'static str,
        /// Source error from the layering library.
        source: config::ConfigError,
    },
}

impl ConfigError {
    pub(crate) const fn layering(operation: &'static str, source: config::ConfigError) -> Self {
        Self::Source { operation, source }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn config_error_display_and_source() {
        let cases = vec![
            (
                ConfigError::InvalidEnvironment {
                    value: "qa".to_string(),
                },
                "invalid environment name",
                false,
            ),
            (
                ConfigError::InvalidField {
                    section: "server",
                    field: "bind",
                    value: Some("nope".to_string()),
                    reason: "not_a_socket_address",
                },
                "invalid configuration field",
                false,
            ),
            (
                ConfigError::ContentRoot {
                    path: None,
                    source: io::Error::other("gone"),
                },
                "content root unavailable",
                true,
            ),
            (
                ConfigError::layering("build", config::ConfigError::Message("bad".to_string())),
                "configuration source failed",
                true,
            ),
        ];

        for (err, message, has_source) in cases {
            assert_eq!(err.to_string(), message);
            assert_eq!(err.source().is_some(), has_source);
        }
    }
}
