//! Shared handler state.

use std::sync::Arc;

use rokvi_core::{CarRepository, ClockService};

/// Capabilities resolved from the service provider for request handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Car lookups.
    pub cars: Arc<dyn CarRepository>,
    /// Time source.
    pub clock: Arc<dyn ClockService>,
}

impl ApiState {
    /// State over the given capabilities.
    #[must_use]
    pub fn new(cars: Arc<dyn CarRepository>, clock: Arc<dyn ClockService>) -> Self {
        Self { cars, clock }
    }
}
