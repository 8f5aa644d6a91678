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

//! Rokvi host bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (process lifecycle and exit codes), `host.rs` (host
//! builder, host, running host), `services.rs` (service registration),
//! `startup.rs` (route and service collaborator), `logging.rs` (reloaded logger
//! configuration), `lifetime.rs` (stop signalling), `lifecycle.rs`
//! (lifecycle events), `cli.rs` (command-line flags).

/// Process lifecycle and exit codes.
pub mod bootstrap;
/// Command-line flags.
pub mod cli;
/// Application error type.
pub mod error;
/// Host builder and running host.
pub mod host;
/// Lifecycle events.
pub mod lifecycle;
/// Host lifetime and console signals.
pub mod lifetime;
/// Reloaded logger configuration.
pub mod logging;
/// Service registration and resolution.
pub mod services;
/// Startup collaborator.
pub mod startup;

pub use bootstrap::{run_app, run_app_with};
pub use cli::HostArgs;
pub use error::{AppError, AppResult};
pub use host::{Host, HostBuilder, HostContext, RunningHost};
pub use lifetime::HostLifetime;
pub use services::{ServiceCollection, ServiceProvider, ServiceProviderOptions};
pub use startup::{DefaultStartup, Startup};
