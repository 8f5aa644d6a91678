use std::sync::Arc;

use anyhow::Result;
use rokvi_api::{ApiServer, ApiServerError, ApiState, SERVER_HEADER_VALUE, routes};
use rokvi_config::ServerOptions;
use rokvi_core::{InMemoryCarRepository, SystemClock};
use tokio::sync::oneshot;

fn state() -> ApiState {
    ApiState::new(
        Arc::new(InMemoryCarRepository::default()),
        Arc::new(SystemClock),
    )
}

fn options(add_server_header: bool) -> ServerOptions {
    ServerOptions {
        bind: "127.0.0.1:0".to_string(),
        add_server_header,
        ..ServerOptions::default()
    }
}

async fn fetch_health(options: &ServerOptions) -> Result<reqwest::Response> {
    let bound = ApiServer::new(routes(state()), options).bind().await?;
    let addr = bound.local_addr();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(bound.serve(async move {
        let _ = stopped.await;
    }));

    let response = reqwest::get(format!("http://{addr}/health")).await?;
    let _ = stop.send(());
    server.await??;
    Ok(response)
}

#[tokio::test]
async fn server_header_is_absent_by_default() -> Result<()> {
    let response = fetch_health(&options(false)).await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().get("server").is_none());
    assert!(response.headers().get("x-request-id").is_some());
    Ok(())
}

#[tokio::test]
async fn server_header_is_emitted_when_configured() -> Result<()> {
    let response = fetch_health(&options(true)).await?;
    assert_eq!(
        response
            .headers()
            .get("server")
            .and_then(|value| value.to_str().ok()),
        Some(SERVER_HEADER_VALUE)
    );
    Ok(())
}

#[tokio::test]
async fn occupied_address_fails_to_bind() -> Result<()> {
    let first = ApiServer::new(routes(state()), &options(false)).bind().await?;
    let taken = ServerOptions {
        bind: first.local_addr().to_string(),
        ..ServerOptions::default()
    };
    let second = ApiServer::new(routes(state()), &taken).bind().await;
    assert!(matches!(second, Err(ApiServerError::Bind { .. })));
    Ok(())
}

#[tokio::test]
async fn invalid_address_is_rejected() {
    let invalid = ServerOptions {
        bind: "not-an-address".to_string(),
        ..ServerOptions::default()
    };
    let result = ApiServer::new(routes(state()), &invalid).bind().await;
    assert!(matches!(result, Err(ApiServerError::Address { .. })));
}
