//! Production telemetry sink.

use std::sync::Arc;

use rokvi_config::TelemetryOptions;
use tracing::Level;

use super::shipping::{HttpTransport, ShippingOptions, ShippingSink, Transport};
use crate::error::TelemetryResult;

/// Header carrying the instrumentation key on ingestion requests.
pub const INSTRUMENTATION_KEY_HEADER: &str = "x-instrumentation-key";

/// Connection settings for the telemetry backend, resolved from services.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TelemetryConfiguration {
    /// Ingestion endpoint for compact JSON batches.
    pub ingestion_endpoint: String,
    /// Key identifying the application.
    pub instrumentation_key: String,
}

impl TelemetryConfiguration {
    /// Returns `true` when an endpoint is set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.ingestion_endpoint.trim().is_empty()
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        if self.instrumentation_key.is_empty() {
            Vec::new()
        } else {
            vec![(INSTRUMENTATION_KEY_HEADER, self.instrumentation_key.clone())]
        }
    }
}

impl From<&TelemetryOptions> for TelemetryConfiguration {
    fn from(options: &TelemetryOptions) -> Self {
        Self {
            ingestion_endpoint: options.ingestion_endpoint.trim().to_string(),
            instrumentation_key: options.instrumentation_key.trim().to_string(),
        }
    }
}

/// Telemetry sink over an explicit transport.
///
/// # Errors
///
/// Returns an error when no Tokio runtime is available.
pub fn telemetry_sink_with(transport: Arc<dyn Transport>) -> TelemetryResult<ShippingSink> {
    ShippingSink::spawn(
        "telemetry",
        Level::TRACE,
        transport,
        ShippingOptions::default(),
    )
}

/// Telemetry sink posting compact JSON batches to the configured endpoint.
///
/// # Errors
///
/// Returns an error when the HTTP client cannot be built or no Tokio runtime
/// is available.
pub fn telemetry_sink(configuration: &TelemetryConfiguration) -> TelemetryResult<ShippingSink> {
    let transport = HttpTransport::compact_json_lines(
        "telemetry",
        configuration.ingestion_endpoint.clone(),
        configuration.headers(),
    )?;
    telemetry_sink_with(Arc::new(transport))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_trims_options() {
        let configuration = TelemetryConfiguration::from(&TelemetryOptions {
            ingestion_endpoint: " https://telemetry.example/ingest ".to_string(),
            instrumentation_key: "abc".to_string(),
        });
        assert!(configuration.is_configured());
        assert_eq!(configuration.ingestion_endpoint, "https://telemetry.example/ingest");
        assert_eq!(
            configuration.headers(),
            vec![(INSTRUMENTATION_KEY_HEADER, "abc".to_string())]
        );
        assert!(!TelemetryConfiguration::default().is_configured());
    }
}
