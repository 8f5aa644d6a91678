//! Option validation.
//!
//! Validation runs when the service provider is built with validation enabled,
//! and always for fields that would make the host unusable.

use std::net::SocketAddr;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{ApplicationOptions, ErrorReportingOptions, ServerOptions, TelemetryOptions};

impl ApplicationOptions {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_server(&self.server)?;
        if self.logging.locale.trim().is_empty() {
            return Err(invalid("logging", "locale", None, "empty"));
        }
        validate_telemetry(&self.telemetry)?;
        validate_error_reporting(&self.error_reporting)
    }
}

impl ServerOptions {
    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when `bind` is not a socket address.
    pub fn bind_address(&self) -> ConfigResult<SocketAddr> {
        self.bind.trim().parse().map_err(|_| {
            invalid(
                "server",
                "bind",
                Some(self.bind.clone()),
                "not_a_socket_address",
            )
        })
    }
}

fn validate_server(server: &ServerOptions) -> ConfigResult<()> {
    server.bind_address()?;
    if server.request_timeout_seconds == 0 {
        return Err(invalid("server", "request_timeout_seconds", Some("0".into()), "must_be_positive"));
    }
    if server.shutdown_timeout_seconds == 0 {
        return Err(invalid("server", "shutdown_timeout_seconds", Some("0".into()), "must_be_positive"));
    }
    if server.max_request_body_bytes == 0 {
        return Err(invalid("server", "max_request_body_bytes", Some("0".into()), "must_be_positive"));
    }
    if server.reload_on_change {
        return Err(invalid("server", "reload_on_change", Some("true".into()), "reload_not_supported"));
    }
    Ok(())
}

fn validate_telemetry(telemetry: &TelemetryOptions) -> ConfigResult<()> {
    if !telemetry.is_configured() {
        return Ok(());
    }
    if !is_http_url(&telemetry.ingestion_endpoint) {
        return Err(invalid(
            "telemetry",
            "ingestion_endpoint",
            Some(telemetry.ingestion_endpoint.clone()),
            "not_an_http_url",
        ));
    }
    Ok(())
}

fn validate_error_reporting(reporting: &ErrorReportingOptions) -> ConfigResult<()> {
    let dsn = reporting.dsn.trim();
    if !is_http_url(dsn) || !dsn.contains('@') {
        return Err(invalid("error_reporting", "dsn", None, "malformed_dsn"));
    }
    Ok(())
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

const fn invalid(
    section: &'static str,
    field: &'static str,
    value: Option<String>,
    reason: &'static str,
) -> ConfigError {
    ConfigError::InvalidField {
        section,
        field,
        value,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: ConfigResult<()>) -> Option<&'static str> {
        match result {
            Err(ConfigError::InvalidField { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn defaults_are_valid() -> ConfigResult<()> {
        ApplicationOptions::default().validate()
    }

    #[test]
    fn server_fields_are_checked() {
        let mut options = ApplicationOptions::default();
        options.server.bind = "localhost".to_string();
        assert_eq!(field_of(options.validate()), Some("bind"));

        let mut options = ApplicationOptions::default();
        options.server.request_timeout_seconds = 0;
        assert_eq!(field_of(options.validate()), Some("request_timeout_seconds"));

        let mut options = ApplicationOptions::default();
        options.server.reload_on_change = true;
        assert_eq!(field_of(options.validate()), Some("reload_on_change"));
    }

    #[test]
    fn remote_sink_endpoints_are_checked() {
        let mut options = ApplicationOptions::default();
        options.telemetry.ingestion_endpoint = "ftp://telemetry".to_string();
        assert_eq!(field_of(options.validate()), Some("ingestion_endpoint"));

        let mut options = ApplicationOptions::default();
        options.error_reporting.dsn = "https://errors.example/1".to_string();
        assert_eq!(field_of(options.validate()), Some("dsn"));
    }
}
