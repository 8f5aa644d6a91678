use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use rokvi_api::{ApiState, routes};
use rokvi_app::{
    AppError, AppResult, HostArgs, HostBuilder, HostContext, ServiceCollection, ServiceProvider,
    Startup,
};
use rokvi_config::Environment;
use rokvi_core::{Car, InMemoryCarRepository};
use tempfile::TempDir;
use uuid::Uuid;

fn car(registration: &str) -> Car {
    Car {
        id: Uuid::new_v4(),
        registration: registration.to_string(),
        make: "Toyota".to_string(),
        model: "Corolla".to_string(),
        year: 2015,
    }
}

fn builder(root: &TempDir, settings: &[&str]) -> HostBuilder {
    HostBuilder::new(HostArgs {
        environment: None,
        content_root: Some(root.path().to_path_buf()),
        settings: settings.iter().map(ToString::to_string).collect(),
    })
    .use_environment_variables(HashMap::new())
    .use_console_lifetime(false)
}

struct FleetStartup;

impl Startup for FleetStartup {
    fn configure_services(&self, _context: &HostContext, services: &mut ServiceCollection) {
        services.add_car_repository(Arc::new(InMemoryCarRepository::new(vec![car(
            "FROM-STARTUP",
        )])));
    }

    fn configure(&self, _context: &HostContext, provider: &ServiceProvider) -> AppResult<Router> {
        Ok(routes(ApiState::new(
            provider.car_repository(),
            provider.clock(),
        )))
    }
}

#[test]
fn options_layer_files_variables_and_arguments() -> Result<()> {
    let root = TempDir::new()?;
    fs::write(
        root.path().join("appsettings.yaml"),
        "server:\n  add_server_header: true\n  request_timeout_seconds: 9\n",
    )?;
    fs::write(
        root.path().join("appsettings.Test.yaml"),
        "server:\n  request_timeout_seconds: 7\n",
    )?;
    let host = builder(&root, &["server.max_request_body_bytes=2048"])
        .use_environment(Environment::Test)
        .use_environment_variables(HashMap::from([(
            "ROKVI__SERVER__SHUTDOWN_TIMEOUT_SECONDS".to_string(),
            "3".to_string(),
        )]))
        .build()?;

    let options = host.options();
    assert_eq!(host.context().environment, Environment::Test);
    assert_eq!(host.context().application_name, "Rokvi");
    assert!(options.server.add_server_header);
    assert_eq!(options.server.request_timeout_seconds, 7);
    assert_eq!(options.server.max_request_body_bytes, 2048);
    assert_eq!(options.server.shutdown_timeout_seconds, 3);
    Ok(())
}

#[test]
fn development_validates_options_on_build() -> Result<()> {
    let root = TempDir::new()?;
    let settings = ["server.reload_on_change=true"];

    let development = builder(&root, &settings)
        .use_environment(Environment::Development)
        .build();
    assert!(matches!(
        development,
        Err(AppError::Config {
            operation: "services.validate",
            ..
        })
    ));

    let test = builder(&root, &settings)
        .use_environment(Environment::Test)
        .build()?;
    assert!(test.options().server.reload_on_change);
    Ok(())
}

#[test]
fn unknown_environment_is_a_configuration_error() -> Result<()> {
    let root = TempDir::new()?;
    let result = HostBuilder::new(HostArgs {
        environment: Some("qa".to_string()),
        content_root: Some(root.path().to_path_buf()),
        settings: Vec::new(),
    })
    .build();
    assert!(matches!(
        result,
        Err(AppError::Config {
            operation: "host.settings",
            ..
        })
    ));
    Ok(())
}

#[tokio::test]
async fn builder_services_replace_startup_registrations() -> Result<()> {
    let root = TempDir::new()?;
    let from_builder = car("FROM-BUILDER");
    let registered = from_builder.clone();
    let host = builder(&root, &["server.bind=127.0.0.1:0"])
        .use_environment(Environment::Test)
        .use_startup(FleetStartup)
        .configure_services(move |_, services| {
            services.add_car_repository(Arc::new(InMemoryCarRepository::new(vec![registered])));
        })
        .build()?;

    let running = host.start().await?;
    let url = format!("http://{}/cars", running.local_addr());
    let cars: Vec<Car> = reqwest::get(url).await?.json().await?;
    assert_eq!(cars, vec![from_builder]);

    running.stop_and_wait().await?;
    Ok(())
}

#[tokio::test]
async fn stopping_the_lifetime_ends_the_run() -> Result<()> {
    let root = TempDir::new()?;
    let host = builder(&root, &["server.bind=127.0.0.1:0"])
        .use_environment(Environment::Test)
        .build()?;
    let lifetime = host.lifetime();

    let run = tokio::spawn(host.run());
    lifetime.stop_application();

    run.await??;
    assert!(lifetime.is_stopping());
    Ok(())
}
