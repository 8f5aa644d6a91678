#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Layered configuration for the Rokvi host.
//!
//! Layout: `environment.rs` (environment tag), `model.rs` (typed options),
//! `loader.rs` (host settings and layered application sources), `validate.rs`
//! (option validation).

pub mod defaults;
pub mod environment;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use environment::Environment;
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigurationSources, HostSettings, SettingValue, load_application_options};
pub use model::{
    ApplicationOptions, ErrorReportingOptions, LevelOverride, LogLevel, LogSinkKind, LoggingOptions,
    ServerOptions, TelemetryOptions,
};
