// Scheduler metadata sources
//
// A source is the injected handle the job info query reads through. Which one
// is used is decided by configuration at start-up.

pub mod http;
pub mod postgres;
pub mod snapshot;

use crate::config::{SourceConfig, SourceKind};
use crate::db::DbPool;
use crate::errors::JobInfoError;
use crate::models::SchedulerInfo;
use async_trait::async_trait;
use std::sync::Arc;

pub use http::HttpJobInfoSource;
pub use postgres::PostgresJobInfoSource;
pub use snapshot::StaticJobInfoSource;

/// Read-only access to the external scheduler's jobs and triggers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobInfoSource: Send + Sync {
    /// Fetch a point-in-time snapshot of every job and its triggers
    async fn fetch_scheduler_info(&self) -> Result<SchedulerInfo, JobInfoError>;

    /// Fetch a snapshot narrowed to the jobs keyed `job_key`
    ///
    /// Sources that cannot filter return the full snapshot; callers still
    /// look the job up by key.
    async fn fetch_job_info(&self, _job_key: &str) -> Result<SchedulerInfo, JobInfoError> {
        self.fetch_scheduler_info().await
    }

    /// Check that the source can currently be reached
    async fn health_check(&self) -> Result<(), JobInfoError>;

    /// Release connections held by the source
    async fn shutdown(&self) {}

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Build the configured source
#[tracing::instrument(skip(config), fields(kind = ?config.kind))]
pub async fn connect(config: &SourceConfig) -> Result<Arc<dyn JobInfoSource>, JobInfoError> {
    let source: Arc<dyn JobInfoSource> = match config.kind {
        SourceKind::Postgres => {
            let database = config.database.as_ref().ok_or_else(|| {
                JobInfoError::UpstreamUnavailable("No database configured".to_string())
            })?;
            let pool = DbPool::new(database).await?;
            Arc::new(PostgresJobInfoSource::new(
                pool,
                &config.scheduler_name,
                &config.table_prefix,
            )?)
        }
        SourceKind::Http => {
            let http = config.http.as_ref().ok_or_else(|| {
                JobInfoError::UpstreamUnavailable("No HTTP source configured".to_string())
            })?;
            Arc::new(HttpJobInfoSource::new(http)?)
        }
        SourceKind::File => {
            let path = config.snapshot_path.as_deref().ok_or_else(|| {
                JobInfoError::UpstreamUnavailable("No snapshot path configured".to_string())
            })?;
            Arc::new(StaticJobInfoSource::from_json_file(path)?)
        }
    };

    tracing::info!(source = source.name(), "Scheduler metadata source ready");
    Ok(source)
}
