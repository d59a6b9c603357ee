use crate::db::repositories::QuartzRepository;
use crate::db::DbPool;
use crate::errors::JobInfoError;
use crate::models::SchedulerInfo;
use crate::source::JobInfoSource;
use async_trait::async_trait;
use tracing::instrument;

/// Source backed by the scheduler's own Quartz tables in PostgreSQL
pub struct PostgresJobInfoSource {
    repository: QuartzRepository,
}

impl PostgresJobInfoSource {
    pub fn new(pool: DbPool, scheduler_name: &str, table_prefix: &str) -> Result<Self, JobInfoError> {
        Ok(Self {
            repository: QuartzRepository::new(pool, scheduler_name, table_prefix)?,
        })
    }
}

#[async_trait]
impl JobInfoSource for PostgresJobInfoSource {
    #[instrument(skip(self))]
    async fn fetch_scheduler_info(&self) -> Result<SchedulerInfo, JobInfoError> {
        Ok(self.repository.load_snapshot().await?)
    }

    #[instrument(skip(self))]
    async fn fetch_job_info(&self, job_key: &str) -> Result<SchedulerInfo, JobInfoError> {
        Ok(self.repository.load_job(job_key).await?)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), JobInfoError> {
        Ok(self.repository.pool().health_check().await?)
    }

    async fn shutdown(&self) {
        self.repository.pool().close().await;
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
