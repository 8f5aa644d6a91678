//! # Design
//!
//! - One crate-level error for binding and serving the web transport.
//! - Messages stay constant; the address and sources carry the context.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use rokvi_config::ConfigError;

/// Result alias for web transport operations.
pub type ApiServerResult<T> = std::result::Result<T, ApiServerError>;

/// Errors raised while binding or serving the web transport.
#[derive(Debug)]
pub enum ApiServerError {
    /// The configured bind address was invalid.
    Address {
        /// Underlying configuration error.
        source: ConfigError,
    },
    /// Binding the listener failed.
    Bind {
        /// Address attempted.
        addr: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Serving requests failed.
    Serve {
        /// Underlying IO error.
        source: std::io::Error,
    },
}

impl Display for ApiServerError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address { .. } => formatter.write_str("invalid web transport bind address"),
            Self::Bind { .. } => formatter.write_str("failed to bind web transport listener"),
            Self::Serve { .. } => formatter.write_str("web transport terminated unexpectedly"),
        }
    }
}

impl Error for ApiServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Address { source } => Some(source),
            Self::Bind { source, .. } | Self::Serve { source } => Some(source),
        }
    }
}
