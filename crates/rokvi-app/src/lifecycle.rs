//! Lifecycle events emitted around the host run.
//!
//! Messages are constant so sinks and tests can match on them; the host
//! context travels as fields.

use tracing::{error, info};

use crate::error::AppError;
use crate::host::HostContext;

/// Message of the event emitted once the host is built.
pub const STARTED: &str = "application started";
/// Message of the event emitted after graceful shutdown.
pub const STOPPED: &str = "application stopped";
/// Message of the single event emitted for a failed run.
pub const TERMINATED: &str = "application terminated unexpectedly";

pub(crate) fn started(context: &HostContext) {
    info!(
        event = "lifecycle.started",
        application = %context.application_name,
        environment = %context.environment,
        content_root = %context.content_root.display(),
        "application started"
    );
}

pub(crate) fn stopped(context: &HostContext) {
    info!(
        event = "lifecycle.stopped",
        application = %context.application_name,
        environment = %context.environment,
        "application stopped"
    );
}

pub(crate) fn terminated(context: Option<&HostContext>, err: &AppError) {
    let error = err.chain();
    match context {
        Some(context) => error!(
            event = "lifecycle.terminated",
            application = %context.application_name,
            environment = %context.environment,
            error = %error,
            "application terminated unexpectedly"
        ),
        None => error!(
            event = "lifecycle.terminated",
            error = %error,
            "application terminated unexpectedly"
        ),
    }
}
