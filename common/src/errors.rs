// Error handling framework

use thiserror::Error;
use uuid::Uuid;

/// Schedule validation errors
///
/// Out-of-range period and jitter values are clamped at creation rather
/// than rejected, so only the URL check can fail.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid listing URL: {0}")]
    InvalidListingUrl(String),
}

/// Errors raised inside the repost executor adapter.
///
/// These never cross the `ActionExecutor` boundary: the adapter converts
/// every variant into a failed `Outcome` before returning.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Missing LBC_EMAIL or LBC_PASSWORD in configuration")]
    MissingCredentials,

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Repost button not found")]
    RepostControlNotFound,

    #[error("HTTP request failed: {0}")]
    HttpRequestFailed(String),
}

impl From<reqwest::Error> for ExecutorError {
    fn from(err: reqwest::Error) -> Self {
        ExecutorError::HttpRequestFailed(err.to_string())
    }
}

/// Database-specific errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => DatabaseError::QueryFailed(db_err.message().to_string()),
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Errors surfaced by the job runner to its callers
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Schedule not found: {0}")]
    NotFound(Uuid),

    #[error("Schedule {0} is already running")]
    AlreadyRunning(Uuid),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_error_repost_control_display() {
        let err = ExecutorError::RepostControlNotFound;
        assert_eq!(err.to_string(), "Repost button not found");
    }

    #[test]
    fn test_database_error_from_row_not_found() {
        let err: DatabaseError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[test]
    fn test_runner_error_not_found_display() {
        let id = Uuid::new_v4();
        let err = RunnerError::NotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
