//! Host lifetime and console signals.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

/// Stop signal shared by the host, its server, and callers.
#[derive(Debug, Clone)]
pub struct HostLifetime {
    stop: Arc<watch::Sender<bool>>,
}

impl Default for HostLifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl HostLifetime {
    /// Lifetime that has not been stopped.
    #[must_use]
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            stop: Arc::new(stop),
        }
    }

    /// Request a graceful stop. Repeated calls are ignored.
    pub fn stop_application(&self) {
        self.stop.send_if_modified(|stopping| {
            if *stopping {
                false
            } else {
                *stopping = true;
                true
            }
        });
    }

    /// Returns `true` once a stop was requested.
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        *self.stop.borrow()
    }

    /// Resolve once a stop is requested.
    pub async fn stopping(&self) {
        let mut receiver = self.stop.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = receiver.wait_for(|stopping| *stopping).await;
    }
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for sigterm");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!(signal = "ctrl_c", "shutdown requested"),
        () = terminate => info!(signal = "sigterm", "shutdown requested"),
    }
}
