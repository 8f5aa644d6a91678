//! In-process application factory for integration tests.
//!
//! The factory owns a verbose test logger installed as the thread default,
//! registers strict fakes in place of the real capabilities, and starts the
//! host on an ephemeral loopback port in the `Test` environment.
//!
//! Teardown verifies every fake, then stops the host and closes the test
//! logger. Call [`TestApplicationFactory::dispose`] to get the verification
//! result; dropping an undisposed factory verifies too and panics on failure
//! once the host and logger are released.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use rokvi_app::{HostArgs, HostBuilder, RunningHost};
use rokvi_config::{ApplicationOptions, Environment};
use rokvi_telemetry::{ConsoleSink, Locale, LoggerConfiguration, LoggingHandle, OutputFormat};
use tracing::dispatcher::DefaultGuard;
use tracing::level_filters::LevelFilter;

use crate::expectations::{Verifiable, VerificationError};
use crate::mocks::{MockCarRepository, MockClockService};
use crate::output::TestOutputSink;

const TEST_LOCALE: &str = "is-IS";
const LOOPBACK_EPHEMERAL: &str = "127.0.0.1:0";

type HostHook = Box<dyn FnOnce(HostBuilder) -> HostBuilder>;

/// HTTP client bound to a running test host; never follows redirects.
#[derive(Debug, Clone)]
pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET path`.
    #[must_use]
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path))
    }

    /// Underlying client.
    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

/// Hosts the application in-process with strict fakes.
pub struct TestApplicationFactory {
    logging: LoggingHandle,
    output: TestOutputSink,
    car_repository: MockCarRepository,
    clock: MockClockService,
    settings: Vec<(String, String)>,
    hooks: Vec<HostHook>,
    running: Option<RunningHost>,
    options: Option<Arc<ApplicationOptions>>,
    disposed: bool,
    _guard: DefaultGuard,
}

impl std::fmt::Debug for TestApplicationFactory {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TestApplicationFactory")
            .field("settings", &self.settings)
            .field("running", &self.running.is_some())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl Default for TestApplicationFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApplicationFactory {
    /// Factory with fresh fakes and the test logger installed for this thread.
    #[must_use]
    pub fn new() -> Self {
        let locale = Locale::from_tag(TEST_LOCALE);
        let output = TestOutputSink::new(locale.clone());
        let logging = LoggingHandle::new(
            LoggerConfiguration::new()
                .minimum_level(LevelFilter::TRACE)
                .override_level("hyper", LevelFilter::WARN)
                .write_to_console_if(
                    ConsoleSink::debug_enabled(),
                    ConsoleSink::debug(OutputFormat::Text(locale)),
                )
                .write_to_console(output.console())
                .write_to(Arc::new(output.clone())),
        );
        let guard = logging.set_default();
        Self {
            logging,
            output,
            car_repository: MockCarRepository::new(),
            clock: MockClockService::new(),
            settings: Vec::new(),
            hooks: Vec::new(),
            running: None,
            options: None,
            disposed: false,
            _guard: guard,
        }
    }

    /// Fake registered as the car repository.
    #[must_use]
    pub const fn car_repository_mock(&self) -> &MockCarRepository {
        &self.car_repository
    }

    /// Fake registered as the clock.
    #[must_use]
    pub const fn clock_service_mock(&self) -> &MockClockService {
        &self.clock
    }

    /// Sink receiving every event logged while the factory lives.
    #[must_use]
    pub const fn output(&self) -> &TestOutputSink {
        &self.output
    }

    /// Test logger installed for this thread.
    #[must_use]
    pub const fn logging(&self) -> &LoggingHandle {
        &self.logging
    }

    /// Application setting applied when the host is built.
    #[must_use]
    pub fn with_setting(mut self, key: &str, value: &str) -> Self {
        self.settings.push((key.to_string(), value.to_string()));
        self
    }

    /// Customise the host builder, e.g. to replace the startup.
    #[must_use]
    pub fn with_host(mut self, hook: impl FnOnce(HostBuilder) -> HostBuilder + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Start the host on first use and return a client for it.
    ///
    /// # Errors
    ///
    /// Returns an error when the host cannot be built or bound, or the HTTP
    /// client cannot be created.
    pub async fn create_client(&mut self) -> Result<TestClient> {
        if self.running.is_none() {
            self.start().await?;
        }
        let running = self
            .running
            .as_ref()
            .context("test host is not running")?;
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("failed to build test client")?;
        Ok(TestClient {
            client,
            base_url: format!("http://{}", running.local_addr()),
        })
    }

    /// Options the host was built with, once a client was created.
    #[must_use]
    pub fn application_options(&self) -> Option<Arc<ApplicationOptions>> {
        self.options.clone()
    }

    /// Verify every expectation on every fake.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] listing unmet expectations and
    /// unexpected calls.
    pub fn verify_all_mocks(&self) -> Result<(), VerificationError> {
        let mut failures = self.car_repository.failures();
        failures.extend(self.clock.failures());
        VerificationError::check(failures)
    }

    /// Verify the fakes, then stop the host and close the test logger.
    ///
    /// The host and logger are released even when verification fails.
    ///
    /// # Errors
    ///
    /// Returns the [`VerificationError`] when a fake was not satisfied,
    /// otherwise any shutdown failure.
    pub async fn dispose(mut self) -> Result<()> {
        self.disposed = true;
        let verified = self.verify_all_mocks();
        let stopped = match self.running.take() {
            Some(running) => running.stop_and_wait().await,
            None => Ok(()),
        };
        self.logging.close_and_flush().await;
        verified?;
        stopped.context("test host did not shut down cleanly")
    }

    async fn start(&mut self) -> Result<()> {
        let car_repository = self.car_repository.clone();
        let clock = self.clock.clone();
        let mut builder = HostBuilder::new(HostArgs::default())
            .use_environment(Environment::Test)
            .use_environment_variables(HashMap::new())
            .use_setting("server.bind", LOOPBACK_EPHEMERAL)
            .use_console_lifetime(false)
            .configure_services(move |_, services| {
                services
                    .add_car_repository(Arc::new(car_repository))
                    .add_clock(Arc::new(clock));
            });
        for (key, value) in &self.settings {
            builder = builder.use_setting(key, value.as_str());
        }
        for hook in self.hooks.drain(..) {
            builder = hook(builder);
        }

        let host = builder.build().context("failed to build test host")?;
        self.options = Some(host.options());
        self.running = Some(host.start().await.context("failed to start test host")?);
        Ok(())
    }
}

impl Drop for TestApplicationFactory {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }
        let verified = self.verify_all_mocks();
        if let Some(running) = self.running.take() {
            running.stop();
        }
        self.logging.close();
        if std::thread::panicking() {
            return;
        }
        if let Err(err) = verified {
            panic!("{err}: {:#?}", err.failures);
        }
    }
}
