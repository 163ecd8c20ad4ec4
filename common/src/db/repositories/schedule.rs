// Schedule repository: sole owner of the durable schedule records

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{Outcome, Schedule};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

const SCHEDULE_COLUMNS: &str =
    "id, url, period_hours, jitter_minutes, next_run, last_result, active, created_at";

/// Repository for schedule-related database operations
#[derive(Clone)]
pub struct ScheduleRepository {
    pool: DbPool,
}

impl ScheduleRepository {
    /// Create a new ScheduleRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a newly created schedule
    #[instrument(skip(self, schedule), fields(schedule_id = %schedule.id))]
    pub async fn insert(&self, schedule: &Schedule) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO schedules
                (id, url, period_hours, jitter_minutes, next_run, last_result, active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(schedule.id.to_string())
        .bind(&schedule.url)
        .bind(schedule.period_hours)
        .bind(schedule.jitter_minutes)
        .bind(schedule.next_run.map(|t| t.timestamp_millis()))
        .bind(&schedule.last_result)
        .bind(schedule.active)
        .bind(schedule.created_at.timestamp_millis())
        .execute(self.pool.pool())
        .await?;

        tracing::info!(schedule_id = %schedule.id, url = %schedule.url, "Schedule created");
        Ok(())
    }

    /// List every schedule, newest first
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Schedule>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool.pool())
        .await?;

        rows.iter().map(row_to_schedule).collect()
    }

    /// Find a schedule by id
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Schedule>, DatabaseError> {
        let row = sqlx::query(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool.pool())
        .await?;

        row.as_ref().map(row_to_schedule).transpose()
    }

    /// Find schedules that are due at `now`: active, with an unset next
    /// run time or one that has passed. Order is not significant.
    #[instrument(skip(self))]
    pub async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>, DatabaseError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS} FROM schedules
            WHERE active = 1 AND (next_run IS NULL OR next_run <= ?)
            "#
        ))
        .bind(now.timestamp_millis())
        .fetch_all(self.pool.pool())
        .await?;

        let due: Result<Vec<_>, _> = rows.iter().map(row_to_schedule).collect();
        let due = due?;
        tracing::debug!(count = due.len(), "Found schedules due for execution");
        Ok(due)
    }

    /// Persist the outcome of one execution and its new next run time as a
    /// single logical update. Also releases the run lease on the record.
    #[instrument(skip(self, outcome), fields(ok = outcome.ok))]
    pub async fn record_outcome(
        &self,
        id: Uuid,
        outcome: &Outcome,
        next_run: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let affected = sqlx::query(
            r#"
            UPDATE schedules
            SET last_result = ?, next_run = ?, running_since = NULL
            WHERE id = ?
            "#,
        )
        .bind(outcome.as_last_result())
        .bind(next_run.timestamp_millis())
        .bind(id.to_string())
        .execute(self.pool.pool())
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DatabaseError::NotFound(format!("schedule {id}")));
        }

        tracing::info!(
            schedule_id = %id,
            ok = outcome.ok,
            next_run = %next_run,
            "Outcome recorded"
        );
        Ok(())
    }

    /// Flip the active flag, leaving `next_run` and `last_result` alone.
    /// Returns the new value.
    #[instrument(skip(self))]
    pub async fn toggle_active(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let schedule = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("schedule {id}")))?;

        let active = !schedule.active;
        sqlx::query("UPDATE schedules SET active = ? WHERE id = ?")
            .bind(active)
            .bind(id.to_string())
            .execute(self.pool.pool())
            .await?;

        tracing::info!(schedule_id = %id, active, "Schedule toggled");
        Ok(active)
    }

    /// Delete a schedule. Deleting an unknown id is a no-op, matching the
    /// management API contract.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool.pool())
            .await?;

        tracing::info!(schedule_id = %id, "Schedule deleted");
        Ok(())
    }
}

fn row_to_schedule(row: &SqliteRow) -> Result<Schedule, DatabaseError> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| DatabaseError::QueryFailed(format!("Invalid schedule id '{id}': {e}")))?;

    let next_run: Option<i64> = row.try_get("next_run")?;
    let next_run = next_run
        .map(|ms| {
            DateTime::from_timestamp_millis(ms).ok_or_else(|| {
                DatabaseError::QueryFailed(format!("Invalid next_run timestamp: {ms}"))
            })
        })
        .transpose()?;

    let created_at: i64 = row.try_get("created_at")?;
    let created_at = DateTime::from_timestamp_millis(created_at).ok_or_else(|| {
        DatabaseError::QueryFailed(format!("Invalid created_at timestamp: {created_at}"))
    })?;

    Ok(Schedule {
        id,
        url: row.try_get("url")?,
        period_hours: row.try_get("period_hours")?,
        jitter_minutes: row.try_get("jitter_minutes")?,
        next_run,
        last_result: row.try_get("last_result")?,
        active: row.try_get("active")?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn repo() -> ScheduleRepository {
        let pool = DbPool::in_memory().await.unwrap();
        ScheduleRepository::new(pool)
    }

    fn sample(now: DateTime<Utc>) -> Schedule {
        Schedule::new("https://www.leboncoin.fr/ad/1", Some(48.0), Some(7), now).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_round_trip() {
        let repo = repo().await;
        let now = Utc::now();
        let schedule = sample(now);
        repo.insert(&schedule).await.unwrap();

        let loaded = repo.find_by_id(schedule.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, schedule.id);
        assert_eq!(loaded.url, schedule.url);
        assert_eq!(loaded.period_hours, 48.0);
        assert_eq!(loaded.jitter_minutes, 7);
        assert!(loaded.active);
        // Millisecond precision survives the round trip
        assert_eq!(
            loaded.next_run.map(|t| t.timestamp_millis()),
            schedule.next_run.map(|t| t.timestamp_millis())
        );
    }

    #[tokio::test]
    async fn test_find_due_filters_inactive_and_future() {
        let repo = repo().await;
        let now = Utc::now();

        let mut due = sample(now);
        due.next_run = Some(now - Duration::seconds(1));
        repo.insert(&due).await.unwrap();

        let mut inactive = sample(now);
        inactive.next_run = Some(now - Duration::seconds(1));
        inactive.active = false;
        repo.insert(&inactive).await.unwrap();

        let mut future = sample(now);
        future.next_run = Some(now + Duration::hours(1));
        repo.insert(&future).await.unwrap();

        let found = repo.find_due(now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, due.id);
    }

    #[tokio::test]
    async fn test_find_due_treats_unset_next_run_as_due() {
        let repo = repo().await;
        let now = Utc::now();

        let mut fresh = sample(now);
        fresh.next_run = None;
        repo.insert(&fresh).await.unwrap();

        let found = repo.find_due(now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, fresh.id);
    }

    #[tokio::test]
    async fn test_find_due_is_idempotent() {
        let repo = repo().await;
        let now = Utc::now();

        let mut due = sample(now);
        due.next_run = Some(now - Duration::minutes(5));
        repo.insert(&due).await.unwrap();

        let first: Vec<Uuid> = repo.find_due(now).await.unwrap().iter().map(|s| s.id).collect();
        let second: Vec<Uuid> = repo.find_due(now).await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_record_outcome_writes_result_and_next_run() {
        let repo = repo().await;
        let now = Utc::now();
        let schedule = sample(now);
        repo.insert(&schedule).await.unwrap();

        let next = now + Duration::hours(48);
        let outcome = Outcome::failure("Repost button not found");
        repo.record_outcome(schedule.id, &outcome, next).await.unwrap();

        let loaded = repo.find_by_id(schedule.id).await.unwrap().unwrap();
        assert_eq!(
            loaded.last_result.as_deref(),
            Some("ERR: Repost button not found")
        );
        assert_eq!(
            loaded.next_run.map(|t| t.timestamp_millis()),
            Some(next.timestamp_millis())
        );
    }

    #[tokio::test]
    async fn test_record_outcome_unknown_id_is_not_found() {
        let repo = repo().await;
        let result = repo
            .record_outcome(Uuid::new_v4(), &Outcome::success("done"), Utc::now())
            .await;
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_preserves_next_run_and_last_result() {
        let repo = repo().await;
        let now = Utc::now();
        let schedule = sample(now);
        repo.insert(&schedule).await.unwrap();

        let next = now + Duration::hours(2);
        repo.record_outcome(schedule.id, &Outcome::success("Clicked repost flow"), next)
            .await
            .unwrap();

        assert!(!repo.toggle_active(schedule.id).await.unwrap());
        assert!(repo.toggle_active(schedule.id).await.unwrap());

        let loaded = repo.find_by_id(schedule.id).await.unwrap().unwrap();
        assert_eq!(loaded.last_result.as_deref(), Some("OK: Clicked repost flow"));
        assert_eq!(
            loaded.next_run.map(|t| t.timestamp_millis()),
            Some(next.timestamp_millis())
        );
    }

    #[tokio::test]
    async fn test_toggle_unknown_id_is_not_found() {
        let repo = repo().await;
        let result = repo.toggle_active(Uuid::new_v4()).await;
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_is_silent_for_unknown_id() {
        let repo = repo().await;
        assert!(repo.delete(Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let repo = repo().await;
        let now = Utc::now();

        let mut older = sample(now - Duration::minutes(10));
        older.created_at = now - Duration::minutes(10);
        repo.insert(&older).await.unwrap();

        let newer = sample(now);
        repo.insert(&newer).await.unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].id, older.id);
    }
}
