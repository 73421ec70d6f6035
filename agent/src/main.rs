// Agent binary entry point

use anyhow::Context;
use common::config::Settings;
use common::console::{banner, Console, StdoutConsole};
use common::rpc::HttpRpcPublisher;
use common::scheduler::{Scheduler, SchedulerConfig, SchedulerEngine};
use common::sensor::{SensorSimulator, ThreadRngSource};
use common::telemetry;
use common::transport::{readiness_channel, ConnectivityMonitor};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration before logging so the configured level applies
    let settings = Settings::load().context("Failed to load configuration")?;
    settings
        .validate()
        .context("Invalid configuration")?;

    telemetry::init_logging(&settings.observability.log_level)?;

    info!(
        endpoint_url = %settings.cloud.endpoint_url,
        interval_ms = settings.scheduler.interval_ms,
        "Configuration loaded"
    );

    if let Some(port) = settings.observability.metrics_port {
        telemetry::init_metrics(port)?;
    }

    let console: Arc<dyn Console> = Arc::new(StdoutConsole);
    for line in banner(
        &settings.device,
        &settings.cloud.endpoint_url,
        settings.scheduler.interval_ms,
    ) {
        console.print(&line);
    }

    let publisher = HttpRpcPublisher::from_config(&settings.cloud).map_err(|e| {
        error!(error = %e, "Failed to initialize publisher");
        e
    })?;
    info!("Publisher initialized");

    let (handle, gate) = readiness_channel();
    let monitor = Arc::new(ConnectivityMonitor::new(
        &settings.cloud.endpoint_url,
        &settings.transport,
        handle,
    )?);
    info!(target_addr = monitor.target(), "Connectivity monitor created");

    let monitor_task = tokio::spawn({
        let monitor = monitor.clone();
        async move { monitor.run().await }
    });

    let sensor = SensorSimulator::from_config(&settings.sensor, Arc::new(ThreadRngSource));
    let engine = Arc::new(SchedulerEngine::new(
        SchedulerConfig::from_settings(&settings),
        Arc::new(gate),
        Arc::new(publisher),
        sensor,
        console,
    ));

    // Set up graceful shutdown
    let engine_for_shutdown = engine.clone();
    let monitor_for_shutdown = monitor.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        info!("Received Ctrl+C signal, initiating graceful shutdown");
        engine_for_shutdown.stop().await;
        monitor_for_shutdown.stop();
    });

    let loop_task = engine.start();

    let loop_result = loop_task.await.context("Scheduler task panicked")?;
    monitor.stop();
    if let Err(e) = monitor_task.await {
        error!(error = %e, "Connectivity monitor task failed");
    }

    if let Err(e) = loop_result {
        error!(error = %e, "Scheduler error");
        return Err(e.into());
    }

    info!(stats = ?engine.stats(), "Agent stopped");
    Ok(())
}
