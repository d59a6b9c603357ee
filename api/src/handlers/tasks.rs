use axum::{
    extract::{Path, State},
    Json,
};

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::models::{JobInfo, SchedulerInfo, Trigger};

/// Scheduler summary with every job and its triggers
#[tracing::instrument(skip(state))]
pub async fn scheduler_info(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<SchedulerInfo>>, ErrorResponse> {
    let info = state.job_info.scheduler_info().await?;
    tracing::debug!(jobs = info.jobs.len(), "Scheduler info served");
    Ok(Json(SuccessResponse::new(info)))
}

/// One job with its triggers
#[tracing::instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_key): Path<String>,
) -> Result<Json<SuccessResponse<JobInfo>>, ErrorResponse> {
    let job = state.job_info.get_job(&job_key).await?;
    Ok(Json(SuccessResponse::new(job)))
}

/// Triggers of one job; an unknown job yields an empty list
#[tracing::instrument(skip(state))]
pub async fn get_job_triggers(
    State(state): State<AppState>,
    Path(job_key): Path<String>,
) -> Result<Json<SuccessResponse<Vec<Trigger>>>, ErrorResponse> {
    let triggers = state.job_info.get_job_triggers(&job_key).await?;
    tracing::info!(job_key = %job_key, count = triggers.len(), "Job triggers served");
    Ok(Json(SuccessResponse::new(triggers)))
}
