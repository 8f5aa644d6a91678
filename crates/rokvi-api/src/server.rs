//! Web transport tuned from the `Server` section.
//!
//! # Design
//! - Options are read once when the server is assembled; nothing is reloaded.
//! - The `server` identification header is only emitted when configured.
//! - Binding and serving are separate steps so callers learn the bound address
//!   (including ephemeral ports) before requests are accepted.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use rokvi_config::ServerOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};

/// Value of the `server` header when enabled.
pub const SERVER_HEADER_VALUE: &str = "Rokvi";
const HEADER_REQUEST_ID: &str = "x-request-id";

/// Router wrapped with the transport middleware.
pub struct ApiServer {
    router: Router,
    options: ServerOptions,
}

impl ApiServer {
    /// Wrap `router` with tracing, request ids, timeout, body limit, and the
    /// optional server header.
    #[must_use]
    pub fn new(router: Router, options: &ServerOptions) -> Self {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(|response: &Response, latency: Duration, _span: &Span| {
                let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                info!(
                    status = response.status().as_u16(),
                    latency_ms,
                    "request finished"
                );
            });

        let mut router = router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(options.max_request_body_bytes))
                .layer(trace_layer)
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    options.request_timeout(),
                )),
        );
        if options.add_server_header {
            router = router.layer(SetResponseHeaderLayer::overriding(
                header::SERVER,
                HeaderValue::from_static(SERVER_HEADER_VALUE),
            ));
        }
        Self {
            router,
            options: options.clone(),
        }
    }

    /// Bind the configured address.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Address`] for an unparsable address and
    /// [`ApiServerError::Bind`] when the listener cannot be opened.
    pub async fn bind(self) -> ApiServerResult<BoundServer> {
        let addr = self
            .options
            .bind_address()
            .map_err(|source| ApiServerError::Address { source })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ApiServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(BoundServer {
            listener,
            router: self.router,
            local_addr,
        })
    }
}

/// Listener bound and ready to serve.
pub struct BoundServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl BoundServer {
    /// Address actually bound.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Serve`] when the accept loop fails.
    pub async fn serve<F>(self, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %self.local_addr, "web transport listening");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }
}
