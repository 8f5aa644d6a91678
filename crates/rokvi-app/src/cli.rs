//! Command-line flags for the host.

use std::path::PathBuf;

use clap::Parser;
use rokvi_config::defaults::{HOST_CONTENT_ROOT_VAR, HOST_ENVIRONMENT_VAR};

use crate::error::{AppError, AppResult};

/// Host-level flags; each also reads its `ROKVI_` environment variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "rokvi", version, about = "Rokvi web service host")]
pub struct HostArgs {
    /// Runtime environment (`Development`, `Staging`, `Production`, `Test`).
    #[arg(long, env = HOST_ENVIRONMENT_VAR)]
    pub environment: Option<String>,
    /// Directory searched for `appsettings*.yaml`.
    #[arg(long, env = HOST_CONTENT_ROOT_VAR)]
    pub content_root: Option<PathBuf>,
    /// Application setting override, `Section.key=value`.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,
}

impl HostArgs {
    /// Parse flags from an explicit argument list.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Arguments`] when the flags are malformed or help
    /// or version output was requested.
    pub fn parse_from_iter<I, T>(args: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|source| AppError::Arguments { source })
    }

    /// Parse flags from the process arguments.
    ///
    /// # Errors
    ///
    /// See [`HostArgs::parse_from_iter`].
    pub fn from_process() -> AppResult<Self> {
        Self::try_parse().map_err(|source| AppError::Arguments { source })
    }
}
