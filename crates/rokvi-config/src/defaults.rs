//! Default values shared by the option models and the loader.
//!
//! # Design
//! - Keep every literal default in one place so tests and docs agree.

/// Application name attached to every log event.
pub const APPLICATION_NAME: &str = "Rokvi";
/// Bootstrap-phase variable naming the runtime environment.
pub const HOST_ENVIRONMENT_VAR: &str = "ROKVI_ENVIRONMENT";
/// Bootstrap-phase variable naming the content root.
pub const HOST_CONTENT_ROOT_VAR: &str = "ROKVI_CONTENT_ROOT";
/// Prefix for application environment variables (`ROKVI__SERVER__BIND`).
pub const APP_ENV_PREFIX: &str = "ROKVI";
/// Separator between sections in application environment variables.
pub const APP_ENV_SEPARATOR: &str = "__";
/// Base name of the application settings files under the content root.
pub const SETTINGS_FILE_STEM: &str = "appsettings";
/// Default listen address for the web transport.
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
/// Default request timeout enforced by the web transport.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Default graceful shutdown window.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
/// Default request body limit (30 MiB).
pub const DEFAULT_MAX_REQUEST_BODY_BYTES: usize = 30 * 1024 * 1024;
/// Locale used for text log rendering.
pub const DEFAULT_LOG_LOCALE: &str = "is-IS";
/// Static endpoint key of the external error-reporting service.
pub const DEFAULT_ERROR_REPORTING_DSN: &str =
    "https://5f0c2e8d9a3b4c71b6e2d4a8f9c1e370@errors.rokvi.invalid/4505949364551680";
