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

//! Shared test helpers used across integration suites.
//! Layout: expectations.rs (strict expectation engine), mocks.rs (strict fakes), output.rs (test log sinks), factory.rs (in-process application factory).

pub mod expectations;
pub mod factory;
pub mod mocks;
pub mod output;

pub use expectations::{ExpectationBuilder, MethodMock, Verifiable, VerificationError};
pub use factory::{TestApplicationFactory, TestClient};
pub use mocks::{MockCarRepository, MockClockService};
pub use output::{RecordingTransport, TestOutputSink};
