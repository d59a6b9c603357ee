pub mod health;
pub mod metrics;
pub mod tasks;

// Common response types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::errors::{AuthError, JobInfoError};
use serde::Serialize;

/// Standard API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub trace_id: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" => StatusCode::BAD_REQUEST,
            "upstream_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            "malformed_metadata" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<JobInfoError> for ErrorResponse {
    fn from(err: JobInfoError) -> Self {
        match &err {
            JobInfoError::InvalidJobKey(_) => ErrorResponse::new("validation_error", err.to_string()),
            JobInfoError::JobNotFound(job_key) => ErrorResponse::new("not_found", err.to_string())
                .with_details(serde_json::json!({ "job_key": job_key })),
            JobInfoError::UpstreamUnavailable(_) => {
                ErrorResponse::new("upstream_unavailable", err.to_string())
            }
            JobInfoError::MalformedMetadata(_) => {
                ErrorResponse::new("malformed_metadata", err.to_string())
            }
        }
    }
}

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::SuperuserRequired(_) => ErrorResponse::new("forbidden", err.to_string()),
            _ => ErrorResponse::new("unauthorized", err.to_string()),
        }
    }
}

/// Standard API success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
