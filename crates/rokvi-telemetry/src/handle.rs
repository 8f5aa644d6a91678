//! Explicitly owned logger handle.
//!
//! # Design
//! - One dispatcher per handle; the sink pipeline lives in a
//!   `tracing_subscriber::reload` layer so a swap takes the layer's write lock
//!   and each event is delivered by exactly one pipeline.
//! - Closing swaps in an empty pipeline and flushes the previous sinks; it runs
//!   at most once per handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use tracing::Dispatch;
use tracing::dispatcher::DefaultGuard;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Registry, reload};

use crate::error::{TelemetryError, TelemetryResult};
use crate::format::OutputFormat;
use crate::locale::Locale;
use crate::pipeline::{LoggerConfiguration, Pipeline};
use crate::sink::console::ConsoleSink;

/// Lifecycle phase of a [`LoggingHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerPhase {
    /// Initial pipeline, active until configuration is available.
    Bootstrap,
    /// Pipeline derived from configuration and services.
    Reloaded,
    /// Logger closed and flushed.
    Closed,
}

impl LoggerPhase {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Bootstrap => 0,
            Self::Reloaded => 1,
            Self::Closed => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Bootstrap,
            1 => Self::Reloaded,
            _ => Self::Closed,
        }
    }
}

struct Inner {
    dispatch: Dispatch,
    reload: reload::Handle<Pipeline, Registry>,
    phase: AtomicU8,
    closed: AtomicBool,
    flushes: AtomicUsize,
}

/// Cloneable logging context shared by the bootstrap sequence and the host.
#[derive(Clone)]
pub struct LoggingHandle {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for LoggingHandle {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("LoggingHandle")
            .field("phase", &self.phase())
            .field("flush_count", &self.flush_count())
            .finish_non_exhaustive()
    }
}

impl LoggingHandle {
    /// Handle whose bootstrap pipeline is built from `configuration`.
    #[must_use]
    pub fn new(configuration: LoggerConfiguration) -> Self {
        let (layer, reload) = reload::Layer::new(configuration.create_pipeline());
        let dispatch = Dispatch::new(Registry::default().with(layer));
        Self {
            inner: Arc::new(Inner {
                dispatch,
                reload,
                phase: AtomicU8::new(LoggerPhase::Bootstrap.to_u8()),
                closed: AtomicBool::new(false),
                flushes: AtomicUsize::new(0),
            }),
        }
    }

    /// Bootstrap configuration: console and debug sinks rendering text in
    /// `locale`, `information` minimum level.
    #[must_use]
    pub fn bootstrap_configuration(locale: &Locale) -> LoggerConfiguration {
        LoggerConfiguration::new()
            .minimum_level(LevelFilter::INFO)
            .write_to_console(ConsoleSink::stdout(OutputFormat::Text(locale.clone())))
            .write_to_console_if(
                ConsoleSink::debug_enabled(),
                ConsoleSink::debug(OutputFormat::Text(locale.clone())),
            )
    }

    /// Handle with the bootstrap pipeline.
    #[must_use]
    pub fn bootstrap(locale: &Locale) -> Self {
        Self::new(Self::bootstrap_configuration(locale))
    }

    /// Install this handle's dispatcher process-wide.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::SubscriberInstall`] when a global dispatcher
    /// is already set.
    pub fn install_global(&self) -> TelemetryResult<()> {
        tracing::dispatcher::set_global_default(self.inner.dispatch.clone())
            .map_err(|source| TelemetryError::SubscriberInstall { source })
    }

    /// Make this handle the current thread's dispatcher until the guard drops.
    #[must_use]
    pub fn set_default(&self) -> DefaultGuard {
        tracing::dispatcher::set_default(&self.inner.dispatch)
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> LoggerPhase {
        LoggerPhase::from_u8(self.inner.phase.load(Ordering::SeqCst))
    }

    /// Number of completed close-and-flush passes (zero or one).
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.inner.flushes.load(Ordering::SeqCst)
    }

    /// Replace the active pipeline with one built from `configuration`.
    ///
    /// The swap holds the layer's write lock, so concurrent events land in
    /// either the old or the new pipeline, never both and never neither.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Reload`] when the dispatcher is gone.
    pub fn reload(&self, configuration: LoggerConfiguration) -> TelemetryResult<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.inner
            .reload
            .reload(configuration.create_pipeline())
            .map_err(|source| TelemetryError::Reload { source })?;
        self.inner
            .phase
            .store(LoggerPhase::Reloaded.to_u8(), Ordering::SeqCst);
        Ok(())
    }

    /// Close the logger and flush every sink of the active pipeline.
    ///
    /// Returns `false` when the logger was already closed.
    pub async fn close_and_flush(&self) -> bool {
        let Some(retired) = self.retire() else {
            return false;
        };
        retired.flush().await;
        self.inner
            .phase
            .store(LoggerPhase::Closed.to_u8(), Ordering::SeqCst);
        self.inner.flushes.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Close the logger from synchronous code.
    ///
    /// Console streams are flushed; record sinks are dropped without awaiting
    /// their queues and the flush count is left unchanged. Returns `false`
    /// when the logger was already closed.
    pub fn close(&self) -> bool {
        let Some(retired) = self.retire() else {
            return false;
        };
        retired.flush_consoles();
        self.inner
            .phase
            .store(LoggerPhase::Closed.to_u8(), Ordering::SeqCst);
        true
    }

    fn retire(&self) -> Option<Pipeline> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return None;
        }
        let mut retired = Pipeline::closed();
        let swapped = self
            .inner
            .reload
            .modify(|pipeline| std::mem::swap(pipeline, &mut retired));
        if let Err(err) = swapped {
            eprintln!("rokvi-telemetry: closing logger failed: {err}");
        }
        Some(retired)
    }
}
