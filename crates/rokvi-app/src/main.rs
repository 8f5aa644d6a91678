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

//! Binary entrypoint for the Rokvi web service host.

use std::process::ExitCode;

use rokvi_app::run_app;

/// Runs the host until shutdown and reports the outcome as the exit code.
#[tokio::main]
async fn main() -> ExitCode {
    run_app().await
}
