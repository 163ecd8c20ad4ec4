// Scheduler binary entry point

use chrono::Duration;
use common::config::Settings;
use common::db::DbPool;
use common::executor::{ActionExecutor, LeboncoinExecutor};
use common::scheduler::{JobRunner, Scheduler, SchedulerConfig, SchedulerEngine};
use common::telemetry;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = Settings::load()?;
    settings.validate().map_err(|e| {
        anyhow::anyhow!("Invalid configuration: {}", e)
    })?;

    telemetry::init_logging(&settings.observability.log_level)?;
    telemetry::init_metrics_listener(settings.observability.metrics_port)?;

    info!("Starting Leboncoin repost scheduler");

    if settings.leboncoin.email.is_none() || settings.leboncoin.password.is_none() {
        // Runs still happen; each one records a failed outcome until
        // credentials are configured.
        warn!("Leboncoin credentials are not configured");
    }

    let db_pool = DbPool::new(&settings.database).await.map_err(|e| {
        error!(error = %e, "Failed to initialize database pool");
        e
    })?;
    db_pool.migrate().await?;
    info!(database_url = %settings.database.url, "Schedule store ready");

    let executor = Arc::new(LeboncoinExecutor::new(settings.leboncoin.clone())?)
        as Arc<dyn ActionExecutor>;

    let lease_ttl = Duration::seconds(settings.scheduler.lease_ttl_seconds as i64);
    let runner = Arc::new(JobRunner::new(db_pool.clone(), executor, lease_ttl));

    let scheduler_config = SchedulerConfig {
        tick_interval_seconds: settings.scheduler.tick_interval_seconds,
    };
    let engine = Arc::new(SchedulerEngine::new(scheduler_config, runner));
    info!("Scheduler engine created");

    let engine_for_shutdown = engine.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        info!("Received Ctrl+C signal, initiating graceful shutdown");
        engine_for_shutdown.stop().await;
    });

    engine.start().await?;

    db_pool.close().await;
    info!("Scheduler stopped");
    Ok(())
}
