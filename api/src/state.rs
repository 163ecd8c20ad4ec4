use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use common::config::Settings;
use common::db::DbPool;
use common::scheduler::JobRunner;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    /// Shared with the manual repost endpoint so its executions take the
    /// same per-schedule lease as ticker-driven ones.
    pub runner: Arc<JobRunner>,
    pub config: Arc<Settings>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        db_pool: DbPool,
        runner: Arc<JobRunner>,
        config: Settings,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            db_pool,
            runner,
            config: Arc::new(config),
            metrics,
        }
    }
}
