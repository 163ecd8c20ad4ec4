use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::errors::RunnerError;
use common::jitter::plan_next_run;
use common::models::{Outcome, Schedule};

/// Request to create a new repost schedule
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub url: String,
    pub period_hours: Option<f64>,
    pub jitter_minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub active: bool,
}

/// Create a new schedule
///
/// The first run is planned a full jittered period out, the same way
/// every later run is planned.
#[tracing::instrument(skip(state, req))]
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<Json<SuccessResponse<Uuid>>, ErrorResponse> {
    let now = Utc::now();
    let mut schedule = Schedule::new(req.url, req.period_hours, req.jitter_minutes, now)
        .map_err(|e| ErrorResponse::new("validation_error", e.to_string()))?;
    schedule.next_run = Some(plan_next_run(
        schedule.period_hours,
        schedule.jitter_minutes,
        now,
        &mut rand::thread_rng(),
    ));

    state.runner.repository().insert(&schedule).await.map_err(|e| {
        ErrorResponse::new("database_error", format!("Failed to create schedule: {}", e))
    })?;

    tracing::info!(schedule_id = %schedule.id, url = %schedule.url, "Schedule created");
    Ok(Json(SuccessResponse::new(schedule.id)))
}

/// List all schedules, newest first
#[tracing::instrument(skip(state))]
pub async fn list_schedules(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<Vec<Schedule>>>, ErrorResponse> {
    let schedules = state.runner.repository().list_all().await.map_err(|e| {
        ErrorResponse::new("database_error", format!("Failed to fetch schedules: {}", e))
    })?;

    Ok(Json(SuccessResponse::new(schedules)))
}

/// Trigger one schedule immediately, regardless of due status
///
/// Runs through the shared job runner, so the execution takes the
/// per-schedule lease and writes back `last_result` and a fresh
/// `next_run` exactly like a ticker-driven run.
#[tracing::instrument(skip(state))]
pub async fn repost_now(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Outcome>>, ErrorResponse> {
    let outcome = state.runner.run_now(id).await.map_err(|e| match e {
        RunnerError::NotFound(id) => {
            ErrorResponse::new("not_found", format!("Schedule not found: {}", id))
        }
        RunnerError::AlreadyRunning(id) => {
            ErrorResponse::new("conflict", format!("Schedule {} is already running", id))
        }
        RunnerError::Database(e) => {
            ErrorResponse::new("database_error", format!("Failed to run schedule: {}", e))
        }
    })?;

    tracing::info!(schedule_id = %id, ok = outcome.ok, "Manual repost finished");
    Ok(Json(SuccessResponse::new(outcome)))
}

/// Flip a schedule's active flag
#[tracing::instrument(skip(state))]
pub async fn toggle_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse<ToggleResponse>>, ErrorResponse> {
    let active = state
        .runner
        .repository()
        .toggle_active(id)
        .await
        .map_err(|e| match e {
            common::errors::DatabaseError::NotFound(_) => {
                ErrorResponse::new("not_found", format!("Schedule not found: {}", id))
            }
            e => ErrorResponse::new(
                "database_error",
                format!("Failed to toggle schedule: {}", e),
            ),
        })?;

    tracing::info!(schedule_id = %id, active, "Schedule toggled");
    Ok(Json(SuccessResponse::new(ToggleResponse { active })))
}

/// Delete a schedule; deleting an unknown id is a silent no-op
#[tracing::instrument(skip(state))]
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse<()>>, ErrorResponse> {
    state.runner.repository().delete(id).await.map_err(|e| {
        ErrorResponse::new("database_error", format!("Failed to delete schedule: {}", e))
    })?;

    tracing::info!(schedule_id = %id, "Schedule deleted");
    Ok(Json(SuccessResponse::new(())))
}
