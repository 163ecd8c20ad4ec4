// Job runner: one repost execution from lease to write-back

use crate::db::repositories::ScheduleRepository;
use crate::db::DbPool;
use crate::errors::{DatabaseError, RunnerError};
use crate::executor::ActionExecutor;
use crate::jitter::plan_next_run;
use crate::lock::ScheduleLease;
use crate::models::{Outcome, Schedule};
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Orchestrates single executions: claim the run lease, invoke the action
/// executor, format the outcome, plan the jittered next run, and write
/// everything back through the store as one update.
pub struct JobRunner {
    repo: ScheduleRepository,
    lease: ScheduleLease,
    executor: Arc<dyn ActionExecutor>,
    rng: Mutex<StdRng>,
}

impl JobRunner {
    pub fn new(pool: DbPool, executor: Arc<dyn ActionExecutor>, lease_ttl: Duration) -> Self {
        Self::with_rng(pool, executor, lease_ttl, StdRng::from_entropy())
    }

    /// Like `new`, with a caller-provided random source for deterministic
    /// jitter in tests.
    pub fn with_rng(
        pool: DbPool,
        executor: Arc<dyn ActionExecutor>,
        lease_ttl: Duration,
        rng: StdRng,
    ) -> Self {
        Self {
            repo: ScheduleRepository::new(pool.clone()),
            lease: ScheduleLease::new(pool, lease_ttl),
            executor,
            rng: Mutex::new(rng),
        }
    }

    pub fn repository(&self) -> &ScheduleRepository {
        &self.repo
    }

    /// Run one named schedule immediately, regardless of due status.
    pub async fn run_now(&self, id: Uuid) -> Result<Outcome, RunnerError> {
        let schedule = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(RunnerError::NotFound(id))?;
        self.run_one(&schedule).await
    }

    /// Execute one schedule and persist the outcome.
    ///
    /// Fails with `AlreadyRunning` when another execution holds the lease
    /// and with `NotFound` when the record was deleted in the meantime.
    /// Failed repost attempts are recorded like successes: the next run is
    /// always planned from the unchanged period and jitter, there is no
    /// backoff.
    #[instrument(skip(self, schedule), fields(schedule_id = %schedule.id, url = %schedule.url))]
    pub async fn run_one(&self, schedule: &Schedule) -> Result<Outcome, RunnerError> {
        let Some(_guard) = self.lease.acquire(schedule.id, Utc::now()).await? else {
            // Acquisition also fails when the record no longer exists
            if self.repo.find_by_id(schedule.id).await?.is_none() {
                return Err(RunnerError::NotFound(schedule.id));
            }
            return Err(RunnerError::AlreadyRunning(schedule.id));
        };

        info!("Running repost job");
        let outcome = self.executor.execute(&schedule.url).await;

        let completed_at = Utc::now();
        let next_run = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            plan_next_run(
                schedule.period_hours,
                schedule.jitter_minutes,
                completed_at,
                &mut *rng,
            )
        };

        self.repo
            .record_outcome(schedule.id, &outcome, next_run)
            .await?;

        if outcome.ok {
            counter!("repost_success_total").increment(1);
        } else {
            counter!("repost_failed_total").increment(1);
        }
        info!(ok = outcome.ok, detail = %outcome.detail, next_run = %next_run, "Repost job finished");

        Ok(outcome)
    }

    /// Process every schedule due at `now`, strictly one at a time.
    ///
    /// A failed or already-leased record never aborts the rest of the
    /// batch. Returns the number of schedules actually executed.
    #[instrument(skip(self))]
    pub async fn process_due(&self, now: DateTime<Utc>) -> Result<usize, DatabaseError> {
        let due = self.repo.find_due(now).await?;
        gauge!("schedules_due").set(due.len() as f64);

        let mut processed = 0;
        for schedule in &due {
            match self.run_one(schedule).await {
                Ok(_) => processed += 1,
                Err(RunnerError::AlreadyRunning(id)) => {
                    debug!(schedule_id = %id, "Schedule is already running, skipping");
                }
                Err(e) => {
                    error!(schedule_id = %schedule.id, error = %e, "Failed to process schedule");
                }
            }
        }

        Ok(processed)
    }
}
