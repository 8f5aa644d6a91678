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

//! Web transport for the Rokvi host.
//!
//! Layout: `state.rs` (shared handler state), `handlers.rs` (default routes),
//! `problem.rs` (problem-details errors), `server.rs` (transport tuning, bind,
//! graceful serve), `error.rs`.

pub mod error;
pub mod handlers;
pub(crate) mod problem;
pub mod server;
pub mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use handlers::routes;
pub use server::{ApiServer, BoundServer, SERVER_HEADER_VALUE};
pub use state::ApiState;
