//! Host builder, host, and running host.
//!
//! # Design
//! - `HostBuilder::build` resolves host settings, binds application options
//!   once, registers services, and reloads the logger before any request can
//!   be served.
//! - `Host::start` binds the listener and returns a [`RunningHost`] so callers
//!   (including the test harness) learn the bound address.
//! - Shutdown is driven by the [`HostLifetime`]; the server drains in-flight
//!   requests within the configured shutdown window.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use rokvi_api::{ApiServer, ApiServerResult};
use rokvi_config::{
    ApplicationOptions, ConfigurationSources, Environment, HostSettings, SettingValue,
    load_application_options,
};
use rokvi_core::{InMemoryCarRepository, SystemClock};
use rokvi_telemetry::{LoggingHandle, TelemetryConfiguration};
use tokio::task::{JoinError, JoinHandle};
use tracing::instrument::WithSubscriber;
use tracing::{debug, info, warn};

use crate::cli::HostArgs;
use crate::error::{AppError, AppResult};
use crate::lifetime::{HostLifetime, shutdown_signal};
use crate::logging::configure_reloadable_logger;
use crate::services::{ServiceCollection, ServiceProvider, ServiceProviderOptions};
use crate::startup::{DefaultStartup, Startup};

type ConfigureServices = Box<dyn FnOnce(&HostContext, &mut ServiceCollection) + Send>;

/// Host identity attached to lifecycle events and log enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    /// Application name.
    pub application_name: String,
    /// Runtime environment.
    pub environment: Environment,
    /// Directory settings files were read from.
    pub content_root: PathBuf,
}

impl From<&HostSettings> for HostContext {
    fn from(settings: &HostSettings) -> Self {
        Self {
            application_name: settings.application_name.clone(),
            environment: settings.environment,
            content_root: settings.content_root.clone(),
        }
    }
}

/// Staged host construction.
pub struct HostBuilder {
    args: HostArgs,
    environment: Option<Environment>,
    settings: Vec<(String, SettingValue)>,
    variables: Option<HashMap<String, String>>,
    configure_services: Vec<ConfigureServices>,
    startup: Arc<dyn Startup>,
    logging: Option<LoggingHandle>,
    lifetime: HostLifetime,
    console_lifetime: bool,
}

impl std::fmt::Debug for HostBuilder {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HostBuilder")
            .field("args", &self.args)
            .field("environment", &self.environment)
            .field("settings", &self.settings)
            .field("console_lifetime", &self.console_lifetime)
            .finish_non_exhaustive()
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new(HostArgs::default())
    }
}

impl HostBuilder {
    /// Builder over parsed host flags with the default startup.
    #[must_use]
    pub fn new(args: HostArgs) -> Self {
        Self {
            args,
            environment: None,
            settings: Vec::new(),
            variables: None,
            configure_services: Vec::new(),
            startup: Arc::new(DefaultStartup),
            logging: None,
            lifetime: HostLifetime::new(),
            console_lifetime: true,
        }
    }

    /// Force the environment regardless of flags and `ROKVI_ENVIRONMENT`.
    #[must_use]
    pub const fn use_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Application setting with the highest precedence.
    #[must_use]
    pub fn use_setting(mut self, key: &str, value: impl Into<SettingValue>) -> Self {
        self.settings.push((key.to_string(), value.into()));
        self
    }

    /// Read `ROKVI__` application variables from `variables` instead of the
    /// process environment.
    #[must_use]
    pub fn use_environment_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Register services after the startup collaborator ran.
    #[must_use]
    pub fn configure_services<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&HostContext, &mut ServiceCollection) + Send + 'static,
    {
        self.configure_services.push(Box::new(configure));
        self
    }

    /// Replace the startup collaborator.
    #[must_use]
    pub fn use_startup(mut self, startup: impl Startup + 'static) -> Self {
        self.startup = Arc::new(startup);
        self
    }

    /// Logger handle reloaded once services are registered.
    #[must_use]
    pub fn use_logging(mut self, logging: LoggingHandle) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Share `lifetime` with the host so callers can stop it.
    #[must_use]
    pub fn use_lifetime(mut self, lifetime: HostLifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Stop on Ctrl-C and SIGTERM (enabled by default).
    #[must_use]
    pub const fn use_console_lifetime(mut self, enabled: bool) -> Self {
        self.console_lifetime = enabled;
        self
    }

    /// Resolve configuration, register services, and reload the logger.
    ///
    /// Must run inside a Tokio runtime when remote log sinks are selected.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] for invalid host settings or application
    /// sources, [`AppError::MissingDependency`] for unregistered capabilities,
    /// and [`AppError::Telemetry`] when the logger cannot be reloaded.
    pub fn build(self) -> AppResult<Host> {
        let mut settings = HostSettings::resolve(
            self.args.environment.as_deref(),
            self.args.content_root.clone(),
        )
        .map_err(|err| AppError::config("host.settings", err))?;
        if let Some(environment) = self.environment {
            settings = settings.with_environment(environment);
        }
        let context = HostContext::from(&settings);
        debug!(
            environment = %context.environment,
            content_root = %context.content_root.display(),
            "host settings resolved"
        );

        let mut sources = ConfigurationSources::new(&settings);
        if let Some(variables) = self.variables {
            sources = sources.with_environment_variables(variables);
        }
        for raw in &self.args.settings {
            sources = sources
                .with_raw_override(raw)
                .map_err(|err| AppError::config("host.arguments", err))?;
        }
        for (key, value) in self.settings {
            sources = sources.with_override(&key, value);
        }
        let options = Arc::new(
            load_application_options(&sources)
                .map_err(|err| AppError::config("host.options", err))?,
        );

        let mut services = ServiceCollection::new();
        services
            .add_car_repository(Arc::new(InMemoryCarRepository::default()))
            .add_clock(Arc::new(SystemClock))
            .add_telemetry(TelemetryConfiguration::from(&options.telemetry));
        self.startup.configure_services(&context, &mut services);
        for configure in self.configure_services {
            configure(&context, &mut services);
        }
        let provider = services.build(
            Arc::clone(&options),
            ServiceProviderOptions {
                validate_on_build: context.environment.is_development(),
            },
        )?;

        if let Some(logging) = &self.logging {
            let configuration = configure_reloadable_logger(&context, &provider)?;
            logging
                .reload(configuration)
                .map_err(|err| AppError::telemetry("host.logging_reload", err))?;
        }

        let router = self.startup.configure(&context, &provider)?;
        Ok(Host {
            context,
            provider,
            router,
            lifetime: self.lifetime,
            console_lifetime: self.console_lifetime,
        })
    }
}

/// Built host, ready to bind.
pub struct Host {
    context: HostContext,
    provider: ServiceProvider,
    router: Router,
    lifetime: HostLifetime,
    console_lifetime: bool,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Host")
            .field("context", &self.context)
            .field("console_lifetime", &self.console_lifetime)
            .finish_non_exhaustive()
    }
}

impl Host {
    /// Host identity.
    #[must_use]
    pub const fn context(&self) -> &HostContext {
        &self.context
    }

    /// Resolved services.
    #[must_use]
    pub const fn services(&self) -> &ServiceProvider {
        &self.provider
    }

    /// Effective application options.
    #[must_use]
    pub fn options(&self) -> Arc<ApplicationOptions> {
        self.provider.options()
    }

    /// Stop signal for this host.
    #[must_use]
    pub fn lifetime(&self) -> HostLifetime {
        self.lifetime.clone()
    }

    /// Bind the listener and start serving in the background.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ApiServer`] when the address is invalid or cannot
    /// be bound.
    pub async fn start(self) -> AppResult<RunningHost> {
        let options = self.provider.options();
        let bound = ApiServer::new(self.router, &options.server)
            .bind()
            .await
            .map_err(|err| AppError::api_server("host.bind", err))?;
        let local_addr = bound.local_addr();

        let stopping = self.lifetime.clone();
        let server = tokio::spawn(
            bound
                .serve(async move { stopping.stopping().await })
                .with_current_subscriber(),
        );

        let signal = self.console_lifetime.then(|| {
            let lifetime = self.lifetime.clone();
            tokio::spawn(
                async move {
                    shutdown_signal().await;
                    lifetime.stop_application();
                }
                .with_current_subscriber(),
            )
        });

        info!(
            addr = %local_addr,
            environment = %self.context.environment,
            "host started"
        );
        Ok(RunningHost {
            context: self.context,
            lifetime: self.lifetime,
            local_addr,
            shutdown_timeout: options.server.shutdown_timeout(),
            server: Some(server),
            signal,
        })
    }

    /// Start and block until the lifetime is stopped and the server drained.
    ///
    /// # Errors
    ///
    /// Propagates [`Host::start`] and [`RunningHost::wait_for_shutdown`]
    /// failures.
    pub async fn run(self) -> AppResult<()> {
        let mut running = self.start().await?;
        running.wait_for_shutdown().await
    }
}

/// Host accepting requests.
#[derive(Debug)]
pub struct RunningHost {
    context: HostContext,
    lifetime: HostLifetime,
    local_addr: SocketAddr,
    shutdown_timeout: Duration,
    server: Option<JoinHandle<ApiServerResult<()>>>,
    signal: Option<JoinHandle<()>>,
}

impl RunningHost {
    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Host identity.
    #[must_use]
    pub const fn context(&self) -> &HostContext {
        &self.context
    }

    /// Stop signal for this host.
    #[must_use]
    pub fn lifetime(&self) -> HostLifetime {
        self.lifetime.clone()
    }

    /// Request a graceful stop without waiting.
    pub fn stop(&self) {
        self.lifetime.stop_application();
    }

    /// Wait until the lifetime is stopped and in-flight requests drained, or
    /// until the server exits on its own.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ApiServer`] when serving failed,
    /// [`AppError::Task`] when the server task panicked, and
    /// [`AppError::ShutdownTimeout`] when draining exceeds the window.
    pub async fn wait_for_shutdown(&mut self) -> AppResult<()> {
        let Some(mut server) = self.server.take() else {
            return Ok(());
        };
        let result = tokio::select! {
            () = self.lifetime.stopping() => {
                if let Ok(joined) = tokio::time::timeout(self.shutdown_timeout, &mut server).await {
                    server_outcome(joined)
                } else {
                    server.abort();
                    warn!(
                        timeout_secs = self.shutdown_timeout.as_secs(),
                        "graceful shutdown timed out"
                    );
                    Err(AppError::ShutdownTimeout {
                        seconds: self.shutdown_timeout.as_secs(),
                    })
                }
            }
            joined = &mut server => {
                self.lifetime.stop_application();
                server_outcome(joined)
            }
        };
        if let Some(signal) = self.signal.take() {
            signal.abort();
        }
        result
    }

    /// Stop and wait for the drain to finish.
    ///
    /// # Errors
    ///
    /// See [`RunningHost::wait_for_shutdown`].
    pub async fn stop_and_wait(mut self) -> AppResult<()> {
        self.stop();
        self.wait_for_shutdown().await
    }
}

impl Drop for RunningHost {
    fn drop(&mut self) {
        self.lifetime.stop_application();
        if let Some(signal) = self.signal.take() {
            signal.abort();
        }
    }
}

fn server_outcome(joined: Result<ApiServerResult<()>, JoinError>) -> AppResult<()> {
    joined
        .map_err(|err| AppError::task("host.serve", err))?
        .map_err(|err| AppError::api_server("host.serve", err))
}
