use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use tracing::{info, warn};

mod handlers;
mod middleware;
mod routes;
mod state;

use common::config::Settings;
use common::db::DbPool;
use common::executor::{ActionExecutor, LeboncoinExecutor};
use common::scheduler::JobRunner;
use common::telemetry;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Settings::load()?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    telemetry::init_logging(&config.observability.log_level)?;
    let metrics_handle = telemetry::init_metrics_recorder()?;

    info!(
        host = %config.server.host,
        port = %config.server.port,
        "Starting API server"
    );

    if config.leboncoin.email.is_none() || config.leboncoin.password.is_none() {
        warn!("Leboncoin credentials are not configured, manual reposts will fail");
    }

    let db_pool = DbPool::new(&config.database).await?;
    db_pool.migrate().await?;
    info!(database_url = %config.database.url, "Schedule store ready");

    let executor =
        Arc::new(LeboncoinExecutor::new(config.leboncoin.clone())?) as Arc<dyn ActionExecutor>;
    let lease_ttl = Duration::seconds(config.scheduler.lease_ttl_seconds as i64);
    let runner = Arc::new(JobRunner::new(db_pool.clone(), executor, lease_ttl));

    let state = AppState::new(db_pool.clone(), runner, config.clone(), metrics_handle);
    let app = routes::create_router(state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));
    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    info!("API server stopped");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    info!("Received Ctrl+C signal, initiating graceful shutdown");
}
