//! Reloaded logger configuration.
//!
//! # Design
//! - Derived once the service provider exists: levels and declared sinks from
//!   the `Logging` section, service-registered sinks, host enrichment, then
//!   the environment-selected sinks from [`SinkPlan`].
//! - Remote sinks prefer transports registered as services so tests and
//!   embedders never reach the network.

use std::sync::Arc;

use rokvi_telemetry::{
    ConsoleSink, LoggerConfiguration, OutputFormat, SinkPlan, error_reporting_sink,
    error_reporting_sink_with, telemetry_sink, telemetry_sink_with,
};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::host::HostContext;
use crate::services::ServiceProvider;

/// Build the configuration the bootstrap logger is replaced with.
///
/// # Errors
///
/// Returns [`AppError::Telemetry`] when a remote sink cannot be created.
pub fn configure_reloadable_logger(
    context: &HostContext,
    provider: &ServiceProvider,
) -> AppResult<LoggerConfiguration> {
    let options = provider.options();
    let plan = SinkPlan::for_environment(context.environment);

    let mut configuration = LoggerConfiguration::from_options(&options.logging)
        .write_to_all(provider.log_sinks().iter().cloned())
        .enrich_with_property("Application", context.application_name.as_str())
        .enrich_with_property("Environment", context.environment.as_str());

    if plan.telemetry {
        let telemetry = provider.telemetry();
        let sink = match provider.telemetry_transport() {
            Some(transport) => Some(telemetry_sink_with(transport)),
            None if telemetry.is_configured() => Some(telemetry_sink(telemetry)),
            None => {
                warn!(
                    sink = "telemetry",
                    "telemetry ingestion endpoint not configured; sink skipped"
                );
                None
            }
        };
        if let Some(sink) = sink {
            let sink = sink.map_err(|err| AppError::telemetry("logging.telemetry_sink", err))?;
            configuration = configuration.write_to(Arc::new(sink));
        }
    }

    if plan.structured_console {
        configuration = configuration
            .write_to_console(ConsoleSink::stdout(OutputFormat::CompactJson))
            .write_to_console_if(
                ConsoleSink::debug_enabled(),
                ConsoleSink::debug(OutputFormat::CompactJson),
            );
    }

    if plan.error_reporting {
        let sink = match provider.error_reporting_transport() {
            Some(transport) => error_reporting_sink_with(transport),
            None => error_reporting_sink(&options.error_reporting.dsn),
        }
        .map_err(|err| AppError::telemetry("logging.error_reporting_sink", err))?;
        configuration = configuration.write_to(Arc::new(sink));
    }

    Ok(configuration)
}
