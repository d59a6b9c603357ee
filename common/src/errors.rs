// Error handling framework for the job info service

use thiserror::Error;

/// Errors surfaced by the job metadata query
#[derive(Error, Debug)]
pub enum JobInfoError {
    #[error("Invalid job key: {0}")]
    InvalidJobKey(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Scheduler metadata source unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Malformed scheduler metadata: {0}")]
    MalformedMetadata(String),
}

/// Schedule-related errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// Authentication and authorization errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Superuser access required for {0}")]
    SuperuserRequired(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
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

    #[error("Row decoding failed: {0}")]
    DecodeFailed(String),

    #[error("Invalid table prefix: {0}")]
    InvalidTablePrefix(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                DatabaseError::DecodeFailed(err.to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionFailed(err.to_string())
            }
            sqlx::Error::Database(db_err) => DatabaseError::QueryFailed(db_err.message().to_string()),
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<DatabaseError> for JobInfoError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::DecodeFailed(_) => JobInfoError::MalformedMetadata(err.to_string()),
            _ => JobInfoError::UpstreamUnavailable(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for JobInfoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            JobInfoError::MalformedMetadata(err.to_string())
        } else {
            JobInfoError::UpstreamUnavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_error_display() {
        let err = ScheduleError::InvalidCronExpression {
            expression: "* * * *".to_string(),
            reason: "invalid format".to_string(),
        };
        assert!(err.to_string().contains("Invalid cron expression"));
    }

    #[test]
    fn test_connection_failure_maps_to_upstream_unavailable() {
        let err: JobInfoError = DatabaseError::ConnectionFailed("refused".to_string()).into();
        assert!(matches!(err, JobInfoError::UpstreamUnavailable(_)));
    }

    #[test]
    fn test_decode_failure_maps_to_malformed_metadata() {
        let err: JobInfoError = DatabaseError::DecodeFailed("bad column".to_string()).into();
        assert!(matches!(err, JobInfoError::MalformedMetadata(_)));
    }

    #[test]
    fn test_pool_timeout_is_connection_failure() {
        let err: DatabaseError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DatabaseError::ConnectionFailed(_)));
    }
}
