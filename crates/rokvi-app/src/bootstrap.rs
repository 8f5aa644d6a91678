//! Process lifecycle: bootstrap logger, host run, exit code.
//!
//! # Design
//! - The bootstrap logger is installed before anything else so configuration
//!   failures are still reported.
//! - Every failure after that point (errors and panics alike) is logged once
//!   as the terminal lifecycle event and mapped to exit code 1.
//! - The logger is closed and flushed exactly once on every exit path.

use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};

use rokvi_telemetry::{Locale, LoggingHandle};
use tracing::info;
use tracing::instrument::WithSubscriber;

use crate::cli::HostArgs;
use crate::error::{AppError, AppResult};
use crate::host::{HostBuilder, HostContext};
use crate::lifecycle;

/// Exit code for a clean shutdown.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code for any failure.
pub const EXIT_FAILURE: u8 = 1;

/// Binary entry point: install the bootstrap logger, parse flags, run the
/// host until shutdown.
pub async fn run_app() -> ExitCode {
    let logging = LoggingHandle::bootstrap(&Locale::default());
    if let Err(err) = logging.install_global() {
        eprintln!("rokvi: installing the bootstrap logger failed: {err}");
    }

    let parsed = HostArgs::from_process();
    if let Err(AppError::Arguments { source }) = &parsed
        && !source.use_stderr()
    {
        // Help and version output.
        if let Err(err) = source.print() {
            eprintln!("rokvi: {err}");
        }
        return ExitCode::SUCCESS;
    }

    ExitCode::from(run_app_with(logging, move || parsed.map(HostBuilder::new)).await)
}

/// Run the bootstrap sequence against an already created logger.
///
/// `configure` produces the host builder; the logger is attached to it and
/// reloaded while the host is built. Returns the process exit code.
pub async fn run_app_with<F>(logging: LoggingHandle, configure: F) -> u8
where
    F: FnOnce() -> AppResult<HostBuilder> + Send + 'static,
{
    info!(event = "lifecycle.initialising", "initialising");

    let context: Arc<Mutex<Option<HostContext>>> = Arc::default();
    let task = tokio::spawn(
        run_host(logging.clone(), configure, Arc::clone(&context)).with_current_subscriber(),
    );
    let outcome = match task.await {
        Ok(result) => result,
        Err(err) => Err(AppError::task("bootstrap.run", err)),
    };

    let code = match outcome {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            let context = context
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            lifecycle::terminated(context.as_ref(), &err);
            EXIT_FAILURE
        }
    };

    logging.close_and_flush().await;
    code
}

async fn run_host<F>(
    logging: LoggingHandle,
    configure: F,
    slot: Arc<Mutex<Option<HostContext>>>,
) -> AppResult<()>
where
    F: FnOnce() -> AppResult<HostBuilder>,
{
    let host = configure()?.use_logging(logging).build()?;
    let context = host.context().clone();
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(context.clone());

    lifecycle::started(&context);
    host.run().await?;
    lifecycle::stopped(&context);
    Ok(())
}
