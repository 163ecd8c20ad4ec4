// Telemetry: structured logging and Prometheus metrics

use anyhow::Result;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize structured logging with JSON formatting
///
/// Log levels come from `RUST_LOG` when set, otherwise from configuration.
pub fn init_logging(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_target(true)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(log_level, "Structured logging initialized");
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "repost_success_total",
        "Total number of successful repost executions"
    );
    describe_counter!(
        "repost_failed_total",
        "Total number of failed repost executions"
    );
    describe_gauge!(
        "schedules_due",
        "Number of schedules due at the most recent evaluation"
    );
}

/// Initialize a Prometheus exporter with its own HTTP listener
///
/// Used by the scheduler binary, which has no web surface of its own.
pub fn init_metrics_listener(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_metrics();

    tracing::info!(metrics_port, "Prometheus metrics exporter initialized");
    Ok(())
}

/// Install a Prometheus recorder and return its render handle
///
/// Used by the api binary, which serves the rendered metrics on its own
/// `/metrics` route.
pub fn init_metrics_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    describe_metrics();

    tracing::info!("Prometheus metrics recorder initialized");
    Ok(handle)
}
