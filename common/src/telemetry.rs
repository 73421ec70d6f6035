// Telemetry module for structured logging and metrics

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Number of consecutive publish failures that raises an alert
pub const ALERT_THRESHOLD: u32 = 3;

/// Initialize structured logging with JSON formatting
///
/// `RUST_LOG` takes precedence over the configured level.
#[tracing::instrument(skip_all)]
pub fn init_logging(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(
        log_level = log_level,
        "Structured logging initialized with JSON formatting"
    );

    Ok(())
}

/// Initialize Prometheus metrics exporter
///
/// Registers:
/// - publish_success_total
/// - publish_failed_total
/// - publish_duration_seconds
/// - sensor_reading_value
/// - transport_ready
#[tracing::instrument(skip_all)]
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!(
        "publish_success_total",
        "Total number of readings acknowledged by the endpoint"
    );
    describe_counter!(
        "publish_failed_total",
        "Total number of readings that failed to publish"
    );
    describe_histogram!(
        "publish_duration_seconds",
        "Time from sending a reading to receiving its response"
    );
    describe_gauge!("sensor_reading_value", "Most recent simulated reading");
    describe_gauge!(
        "transport_ready",
        "1 when the publish transport is reachable, 0 otherwise"
    );

    tracing::info!(
        metrics_port = metrics_port,
        metrics_endpoint = format!("http://0.0.0.0:{}/metrics", metrics_port),
        "Prometheus metrics exporter initialized"
    );

    Ok(())
}

#[inline]
pub fn record_reading(value: f64) {
    gauge!("sensor_reading_value").set(value);
}

#[inline]
pub fn record_publish_success(command: &str, duration_seconds: f64) {
    counter!("publish_success_total", "command" => command.to_string()).increment(1);
    histogram!("publish_duration_seconds", "command" => command.to_string())
        .record(duration_seconds);
}

#[inline]
pub fn record_publish_failure(command: &str, reason: &str) {
    counter!(
        "publish_failed_total",
        "command" => command.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

#[inline]
pub fn update_transport_ready(ready: bool) {
    gauge!("transport_ready").set(if ready { 1.0 } else { 0.0 });
}

/// Returns true once consecutive failures reach the alert threshold
#[inline]
pub fn should_trigger_alert(consecutive_failures: u32) -> bool {
    consecutive_failures >= ALERT_THRESHOLD
}

/// Log an alert for repeated publish failures
pub fn alert_consecutive_failures(endpoint: &str, consecutive_failures: u32) {
    tracing::error!(
        endpoint = endpoint,
        consecutive_failures = consecutive_failures,
        alert_type = "consecutive_publish_failures",
        "ALERT: Publishing has failed {} consecutive times",
        consecutive_failures
    );
}
