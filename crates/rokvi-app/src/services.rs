//! Service registration and resolution.
//!
//! # Design
//! - Registration is explicit: later registrations of a capability replace
//!   earlier ones, log sinks accumulate.
//! - The built provider is immutable and shared by the startup collaborator,
//!   the reloaded logger, and request handlers.

use std::fmt;
use std::sync::Arc;

use rokvi_config::ApplicationOptions;
use rokvi_core::{CarRepository, ClockService};
use rokvi_telemetry::{SharedSink, TelemetryConfiguration, Transport};

use crate::error::{AppError, AppResult};

/// Provider construction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceProviderOptions {
    /// Validate application options while building the provider.
    pub validate_on_build: bool,
}

/// Mutable registry of services assembled before the host is built.
#[derive(Default)]
pub struct ServiceCollection {
    car_repository: Option<Arc<dyn CarRepository>>,
    clock: Option<Arc<dyn ClockService>>,
    log_sinks: Vec<SharedSink>,
    telemetry: Option<TelemetryConfiguration>,
    telemetry_transport: Option<Arc<dyn Transport>>,
    error_reporting_transport: Option<Arc<dyn Transport>>,
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServiceCollection")
            .field("car_repository", &self.car_repository.is_some())
            .field("clock", &self.clock.is_some())
            .field(
                "log_sinks",
                &self.log_sinks.iter().map(|sink| sink.name()).collect::<Vec<_>>(),
            )
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

impl ServiceCollection {
    /// Empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the car repository.
    pub fn add_car_repository(&mut self, repository: Arc<dyn CarRepository>) -> &mut Self {
        self.car_repository = Some(repository);
        self
    }

    /// Register the clock.
    pub fn add_clock(&mut self, clock: Arc<dyn ClockService>) -> &mut Self {
        self.clock = Some(clock);
        self
    }

    /// Register an additional log sink for the reloaded logger.
    pub fn add_log_sink(&mut self, sink: SharedSink) -> &mut Self {
        self.log_sinks.push(sink);
        self
    }

    /// Register the telemetry connection settings.
    pub fn add_telemetry(&mut self, configuration: TelemetryConfiguration) -> &mut Self {
        self.telemetry = Some(configuration);
        self
    }

    /// Route telemetry batches through `transport` instead of HTTP.
    pub fn add_telemetry_transport(&mut self, transport: Arc<dyn Transport>) -> &mut Self {
        self.telemetry_transport = Some(transport);
        self
    }

    /// Route error reports through `transport` instead of HTTP.
    pub fn add_error_reporting_transport(&mut self, transport: Arc<dyn Transport>) -> &mut Self {
        self.error_reporting_transport = Some(transport);
        self
    }

    /// Freeze the collection into a provider.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingDependency`] when a required capability was
    /// never registered, and [`AppError::Config`] when validation is enabled
    /// and the options are inconsistent.
    pub fn build(
        self,
        options: Arc<ApplicationOptions>,
        provider_options: ServiceProviderOptions,
    ) -> AppResult<ServiceProvider> {
        if provider_options.validate_on_build {
            options
                .validate()
                .map_err(|source| AppError::config("services.validate", source))?;
        }
        let car_repository = self.car_repository.ok_or(AppError::MissingDependency {
            name: "car_repository",
        })?;
        let clock = self
            .clock
            .ok_or(AppError::MissingDependency { name: "clock" })?;
        let telemetry = self
            .telemetry
            .unwrap_or_else(|| TelemetryConfiguration::from(&options.telemetry));
        Ok(ServiceProvider {
            options,
            car_repository,
            clock,
            log_sinks: self.log_sinks,
            telemetry,
            telemetry_transport: self.telemetry_transport,
            error_reporting_transport: self.error_reporting_transport,
        })
    }
}

/// Resolved services shared with the startup collaborator and handlers.
#[derive(Clone)]
pub struct ServiceProvider {
    options: Arc<ApplicationOptions>,
    car_repository: Arc<dyn CarRepository>,
    clock: Arc<dyn ClockService>,
    log_sinks: Vec<SharedSink>,
    telemetry: TelemetryConfiguration,
    telemetry_transport: Option<Arc<dyn Transport>>,
    error_reporting_transport: Option<Arc<dyn Transport>>,
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServiceProvider")
            .field("options", &self.options)
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

impl ServiceProvider {
    /// Effective application options.
    #[must_use]
    pub fn options(&self) -> Arc<ApplicationOptions> {
        Arc::clone(&self.options)
    }

    /// Registered car repository.
    #[must_use]
    pub fn car_repository(&self) -> Arc<dyn CarRepository> {
        Arc::clone(&self.car_repository)
    }

    /// Registered clock.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn ClockService> {
        Arc::clone(&self.clock)
    }

    /// Log sinks registered as services.
    #[must_use]
    pub fn log_sinks(&self) -> &[SharedSink] {
        &self.log_sinks
    }

    /// Telemetry connection settings.
    #[must_use]
    pub const fn telemetry(&self) -> &TelemetryConfiguration {
        &self.telemetry
    }

    /// Telemetry transport override, when registered.
    #[must_use]
    pub fn telemetry_transport(&self) -> Option<Arc<dyn Transport>> {
        self.telemetry_transport.clone()
    }

    /// Error-reporting transport override, when registered.
    #[must_use]
    pub fn error_reporting_transport(&self) -> Option<Arc<dyn Transport>> {
        self.error_reporting_transport.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rokvi_core::{InMemoryCarRepository, SystemClock};
    use rokvi_telemetry::CaptureSink;

    fn with_defaults() -> ServiceCollection {
        let mut services = ServiceCollection::new();
        services
            .add_car_repository(Arc::new(InMemoryCarRepository::default()))
            .add_clock(Arc::new(SystemClock));
        services
    }

    #[test]
    fn missing_repository_is_reported() {
        let mut services = ServiceCollection::new();
        services.add_clock(Arc::new(SystemClock));
        let result = services.build(
            Arc::new(ApplicationOptions::default()),
            ServiceProviderOptions::default(),
        );
        assert!(matches!(
            result,
            Err(AppError::MissingDependency {
                name: "car_repository"
            })
        ));
    }

    #[test]
    fn validation_runs_only_when_requested() -> AppResult<()> {
        let mut options = ApplicationOptions::default();
        options.server.reload_on_change = true;
        let options = Arc::new(options);

        with_defaults().build(Arc::clone(&options), ServiceProviderOptions::default())?;
        let validated = with_defaults().build(
            options,
            ServiceProviderOptions {
                validate_on_build: true,
            },
        );
        assert!(matches!(
            validated,
            Err(AppError::Config {
                operation: "services.validate",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn telemetry_defaults_to_options_and_sinks_accumulate() -> AppResult<()> {
        let mut options = ApplicationOptions::default();
        options.telemetry.ingestion_endpoint = " https://ingest.example/v1 ".to_string();
        let mut services = with_defaults();
        services
            .add_log_sink(Arc::new(CaptureSink::new()))
            .add_log_sink(Arc::new(CaptureSink::new()));

        let provider = services.build(Arc::new(options), ServiceProviderOptions::default())?;
        assert_eq!(
            provider.telemetry().ingestion_endpoint,
            "https://ingest.example/v1"
        );
        assert_eq!(provider.log_sinks().len(), 2);
        assert!(provider.telemetry_transport().is_none());
        Ok(())
    }
}
