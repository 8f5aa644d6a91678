use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use axum::Router;
use rokvi_app::lifecycle::{STARTED, STOPPED, TERMINATED};
use rokvi_app::{
    AppResult, HostArgs, HostBuilder, HostContext, HostLifetime, ServiceProvider, Startup,
    run_app_with,
};
use rokvi_telemetry::{CaptureSink, LoggerConfiguration, LoggerPhase, LoggingHandle};
use rokvi_test_support::RecordingTransport;
use tempfile::TempDir;

struct Harness {
    logging: LoggingHandle,
    capture: CaptureSink,
    reports: RecordingTransport,
    lifetime: HostLifetime,
    root: TempDir,
}

impl Harness {
    fn new() -> Result<Self> {
        let capture = CaptureSink::new();
        let logging =
            LoggingHandle::new(LoggerConfiguration::new().write_to(Arc::new(capture.clone())));
        Ok(Self {
            logging,
            capture,
            reports: RecordingTransport::new(),
            lifetime: HostLifetime::new(),
            root: TempDir::new()?,
        })
    }

    fn builder(&self, environment: &str, bind: &str) -> HostBuilder {
        let capture = self.capture.clone();
        let reports = self.reports.clone();
        HostBuilder::new(HostArgs {
            environment: Some(environment.to_string()),
            content_root: Some(self.root.path().to_path_buf()),
            settings: vec![format!("server.bind={bind}")],
        })
        .use_environment_variables(HashMap::new())
        .use_setting("logging.write_to", Vec::<String>::new())
        .use_lifetime(self.lifetime.clone())
        .use_console_lifetime(false)
        .configure_services(move |_, services| {
            services
                .add_log_sink(Arc::new(capture))
                .add_error_reporting_transport(Arc::new(reports));
        })
    }

    fn stop_once_started(&self) {
        let capture = self.capture.clone();
        let lifetime = self.lifetime.clone();
        tokio::spawn(async move {
            while capture.position("host started").is_none() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            lifetime.stop_application();
        });
    }
}

struct PanickingStartup;

impl Startup for PanickingStartup {
    fn configure(&self, _context: &HostContext, _provider: &ServiceProvider) -> AppResult<Router> {
        panic!("startup exploded");
    }
}

#[tokio::test]
async fn clean_run_exits_zero_with_ordered_lifecycle_events() -> Result<()> {
    let harness = Harness::new()?;
    let _guard = harness.logging.set_default();
    harness.stop_once_started();

    let builder = harness.builder("Test", "127.0.0.1:0");
    let code = tokio::time::timeout(
        Duration::from_secs(10),
        run_app_with(harness.logging.clone(), move || Ok(builder)),
    )
    .await?;

    assert_eq!(code, 0);
    let capture = &harness.capture;
    let started = capture
        .position(STARTED)
        .ok_or_else(|| anyhow!("started event missing"))?;
    let stopped = capture
        .position(STOPPED)
        .ok_or_else(|| anyhow!("stopped event missing"))?;
    assert!(started < stopped);
    assert_eq!(capture.count(TERMINATED), 0);
    assert_eq!(harness.logging.flush_count(), 1);
    assert_eq!(harness.logging.phase(), LoggerPhase::Closed);
    assert_eq!(capture.flush_count(), 1);
    Ok(())
}

#[tokio::test]
async fn reload_enriches_events_logged_after_build() -> Result<()> {
    let harness = Harness::new()?;
    let _guard = harness.logging.set_default();
    harness.stop_once_started();

    let builder = harness.builder("Test", "127.0.0.1:0");
    let code = run_app_with(harness.logging.clone(), move || Ok(builder)).await;
    assert_eq!(code, 0);

    let records = harness.capture.records();
    let initialising = records
        .iter()
        .find(|record| record.message == "initialising")
        .ok_or_else(|| anyhow!("initialising event missing"))?;
    assert_eq!(initialising.str_value("Application"), None);

    let started = records
        .iter()
        .find(|record| record.message == STARTED)
        .ok_or_else(|| anyhow!("started event missing"))?;
    assert_eq!(started.str_value("Application"), Some("Rokvi"));
    assert_eq!(started.str_value("Environment"), Some("Test"));
    assert_eq!(harness.capture.count(STARTED), 1);
    Ok(())
}

#[tokio::test]
async fn bind_conflict_exits_one_with_a_single_terminated_event() -> Result<()> {
    let occupied = TcpListener::bind("127.0.0.1:0")?;
    let addr = occupied.local_addr()?.to_string();
    let harness = Harness::new()?;
    let _guard = harness.logging.set_default();

    let builder = harness.builder("Test", &addr);
    let code = run_app_with(harness.logging.clone(), move || Ok(builder)).await;

    assert_eq!(code, 1);
    let capture = &harness.capture;
    assert_eq!(capture.count(TERMINATED), 1);
    assert_eq!(capture.count(STOPPED), 0);
    let terminated = capture
        .records()
        .into_iter()
        .find(|record| record.message == TERMINATED)
        .ok_or_else(|| anyhow!("terminated event missing"))?;
    assert_eq!(terminated.str_value("application"), Some("Rokvi"));
    assert_eq!(terminated.str_value("environment"), Some("Test"));
    assert!(
        terminated
            .str_value("error")
            .is_some_and(|error| error.contains("failed to bind web transport listener"))
    );
    assert!(capture.position(STARTED).is_some());
    assert!(capture.position(STARTED) < capture.position(TERMINATED));
    assert_eq!(harness.reports.messages(), vec![TERMINATED]);
    assert_eq!(harness.logging.flush_count(), 1);
    Ok(())
}

#[tokio::test]
async fn panicking_startup_exits_one() -> Result<()> {
    let harness = Harness::new()?;
    let _guard = harness.logging.set_default();

    let builder = harness
        .builder("Test", "127.0.0.1:0")
        .use_startup(PanickingStartup);
    let code = run_app_with(harness.logging.clone(), move || Ok(builder)).await;

    assert_eq!(code, 1);
    assert_eq!(harness.capture.count(TERMINATED), 1);
    assert_eq!(harness.capture.count(STARTED), 0);
    let terminated = harness
        .capture
        .records()
        .into_iter()
        .find(|record| record.message == TERMINATED)
        .ok_or_else(|| anyhow!("terminated event missing"))?;
    assert_eq!(terminated.str_value("application"), None);
    assert!(
        terminated
            .str_value("error")
            .is_some_and(|error| error.starts_with("host task failed"))
    );
    assert_eq!(harness.logging.flush_count(), 1);
    Ok(())
}

#[tokio::test]
async fn configuration_failure_is_reported_by_the_bootstrap_logger() -> Result<()> {
    let harness = Harness::new()?;
    let _guard = harness.logging.set_default();

    let builder = harness.builder("Qa", "127.0.0.1:0");
    let code = run_app_with(harness.logging.clone(), move || Ok(builder)).await;

    assert_eq!(code, 1);
    assert_eq!(harness.capture.count(TERMINATED), 1);
    assert_eq!(harness.logging.phase(), LoggerPhase::Closed);
    assert!(harness.reports.records().is_empty());
    Ok(())
}

#[tokio::test]
async fn failing_configure_callback_exits_one() -> Result<()> {
    let harness = Harness::new()?;
    let _guard = harness.logging.set_default();

    let code = run_app_with(harness.logging.clone(), || {
        HostArgs::parse_from_iter(["rokvi", "--unknown"]).map(HostBuilder::new)
    })
    .await;

    assert_eq!(code, 1);
    assert_eq!(harness.capture.count(TERMINATED), 1);
    assert_eq!(harness.logging.flush_count(), 1);
    Ok(())
}
