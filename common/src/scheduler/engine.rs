// Scheduler engine: fixed-cadence ticker over the due schedules

use crate::scheduler::JobRunner;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info, instrument};

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often the ticker fires (in seconds)
    pub tick_interval_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: 120,
        }
    }
}

/// Scheduler lifecycle operations
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Start the ticker loop; returns once stopped
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Stop the scheduler gracefully
    async fn stop(&self);
}

/// Ticker driving the job runner on a fixed wall-clock cadence.
///
/// Each tick spawns its own batch: a slow batch never delays the next
/// tick, and overlapping batches are safe because every execution claims
/// the per-schedule lease before touching a record.
pub struct SchedulerEngine {
    config: SchedulerConfig,
    runner: Arc<JobRunner>,
    shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

impl SchedulerEngine {
    pub fn new(config: SchedulerConfig, runner: Arc<JobRunner>) -> Self {
        let (shutdown_tx, _shutdown_rx) = tokio::sync::broadcast::channel(1);

        Self {
            config,
            runner,
            shutdown_tx,
        }
    }

    /// Get a shutdown signal receiver
    pub fn shutdown_receiver(&self) -> tokio::sync::broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    fn spawn_batch(&self) {
        let runner = self.runner.clone();
        let now = Utc::now();

        tokio::spawn(async move {
            match runner.process_due(now).await {
                Ok(count) if count > 0 => {
                    info!(schedules_processed = count, "Processed due schedules");
                }
                Ok(_) => {
                    debug!("No schedules due");
                }
                Err(e) => {
                    error!(error = %e, "Error processing due schedules");
                }
            }
        });
    }
}

#[async_trait]
impl Scheduler for SchedulerEngine {
    #[instrument(skip(self))]
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            tick_interval_seconds = self.config.tick_interval_seconds,
            "Starting scheduler engine"
        );

        let mut tick = interval(Duration::from_secs(self.config.tick_interval_seconds));
        let mut shutdown_rx = self.shutdown_receiver();

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    debug!("Tick: evaluating due schedules");
                    self.spawn_batch();
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping scheduler");
                    break;
                }
            }
        }

        info!("Scheduler engine stopped");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
