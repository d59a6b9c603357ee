use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::handlers::ErrorResponse;
use crate::state::AppState;

/// Liveness endpoint
#[tracing::instrument]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness endpoint: the metadata source must be reachable
#[tracing::instrument(skip(state))]
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<(StatusCode, &'static str), ErrorResponse> {
    state.job_info.health_check().await.map_err(|e| {
        tracing::warn!(source = state.job_info.source_name(), error = %e, "Readiness check failed");
        ErrorResponse::from(e)
    })?;
    Ok((StatusCode::OK, "READY"))
}
