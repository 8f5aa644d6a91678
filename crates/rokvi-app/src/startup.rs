//! Startup collaborator: registers services and builds the router.

use axum::Router;
use rokvi_api::{ApiState, routes};

use crate::error::AppResult;
use crate::host::HostContext;
use crate::services::{ServiceCollection, ServiceProvider};

/// Host configuration hooks invoked while the host is built.
pub trait Startup: Send + Sync {
    /// Register or replace services. Runs after the host defaults and before
    /// the builder's own service callbacks.
    fn configure_services(&self, _context: &HostContext, _services: &mut ServiceCollection) {}

    /// Build the application router from resolved services.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the router cannot be assembled.
    fn configure(&self, context: &HostContext, provider: &ServiceProvider) -> AppResult<Router>;
}

/// Mounts the default car and health routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStartup;

impl Startup for DefaultStartup {
    fn configure(&self, _context: &HostContext, provider: &ServiceProvider) -> AppResult<Router> {
        Ok(routes(ApiState::new(
            provider.car_repository(),
            provider.clock(),
        )))
    }
}
