// Per-schedule run leases
//
// At most one execution may hold a given schedule id at a time, across
// both the api and scheduler processes. The lease is a compare-and-swap
// on the `running_since` column of the record itself, since the sqlite
// file is the only resource the two processes share. A TTL lets a record
// recover if a lease holder dies mid-run.

use crate::db::DbPool;
use crate::errors::DatabaseError;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Factory for per-schedule run leases
#[derive(Clone)]
pub struct ScheduleLease {
    pool: DbPool,
    ttl: Duration,
}

impl ScheduleLease {
    pub fn new(pool: DbPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Try to claim the lease on `id` at `now`.
    ///
    /// Succeeds when the record holds no lease, or only a stale one (older
    /// than the TTL). Returns `None` when another execution currently
    /// holds it; unknown ids also yield `None`, callers that care check
    /// existence first.
    #[instrument(skip(self))]
    pub async fn acquire(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<LeaseGuard>, DatabaseError> {
        let stale_before = now - self.ttl;

        let affected = sqlx::query(
            r#"
            UPDATE schedules
            SET running_since = ?
            WHERE id = ? AND (running_since IS NULL OR running_since <= ?)
            "#,
        )
        .bind(now.timestamp_millis())
        .bind(id.to_string())
        .bind(stale_before.timestamp_millis())
        .execute(self.pool.pool())
        .await?
        .rows_affected();

        if affected == 0 {
            debug!(schedule_id = %id, "Run lease already held, skipping");
            return Ok(None);
        }

        debug!(schedule_id = %id, "Run lease acquired");
        Ok(Some(LeaseGuard {
            id,
            acquired_at_ms: now.timestamp_millis(),
            pool: self.pool.clone(),
        }))
    }
}

/// Lease guard that releases the claim when dropped
///
/// The release only matches the guard's own claim, so a stale guard
/// dropped after its lease was reclaimed cannot clear someone else's.
/// The normal completion path (`record_outcome`) clears the lease in the
/// same write as the outcome, making the drop release a no-op there.
pub struct LeaseGuard {
    id: Uuid,
    acquired_at_ms: i64,
    pool: DbPool,
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        let id = self.id;
        let acquired_at_ms = self.acquired_at_ms;
        let pool = self.pool.clone();

        tokio::spawn(async move {
            let result =
                sqlx::query("UPDATE schedules SET running_since = NULL WHERE id = ? AND running_since = ?")
                    .bind(id.to_string())
                    .bind(acquired_at_ms)
                    .execute(pool.pool())
                    .await;
            if let Err(e) = result {
                warn!(schedule_id = %id, error = %e, "Failed to release run lease on drop");
            }
        });
    }
}
