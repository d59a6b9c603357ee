// Job metadata query
//
// Given a job key, return the triggers the external scheduler currently holds
// for it. Unknown jobs and jobs without triggers both yield an empty list; only
// the job detail lookup distinguishes a missing job.

use crate::errors::JobInfoError;
use crate::models::{JobInfo, SchedulerInfo, Trigger};
use crate::source::JobInfoSource;
use crate::telemetry::{self, QueryOutcome};
use std::sync::Arc;
use std::time::Instant;
use tracing::{instrument, warn};

/// Reject empty or whitespace-only job keys
///
/// Keys are matched exactly, so a valid key is returned untouched.
pub fn validate_job_key(job_key: &str) -> Result<&str, JobInfoError> {
    if job_key.trim().is_empty() {
        return Err(JobInfoError::InvalidJobKey(
            "job key must not be empty".to_string(),
        ));
    }
    Ok(job_key)
}

/// Return the triggers of one job, read through the given source
#[instrument(skip(source), fields(source = source.name()))]
pub async fn get_job_triggers(
    source: &dyn JobInfoSource,
    job_key: &str,
) -> Result<Vec<Trigger>, JobInfoError> {
    let job_key = validate_job_key(job_key)?;
    let info = normalize(source.fetch_job_info(job_key).await?);

    let triggers = info
        .jobs
        .into_iter()
        .find(|job| job.key == job_key)
        .map(|job| job.triggers)
        .unwrap_or_default();

    tracing::debug!(job_key = job_key, count = triggers.len(), "Resolved job triggers");
    Ok(triggers)
}

/// Sort jobs and triggers by key and drop duplicate keys
///
/// The first record seen for a key wins. Inconsistent fire times are logged
/// but passed through untouched.
pub fn normalize(mut info: SchedulerInfo) -> SchedulerInfo {
    info.jobs.sort_by(|a, b| a.key.cmp(&b.key));
    let job_count = info.jobs.len();
    info.jobs.dedup_by(|later, earlier| later.key == earlier.key);
    if info.jobs.len() != job_count {
        warn!(
            dropped = job_count - info.jobs.len(),
            "Scheduler reported duplicate job keys"
        );
    }

    for job in &mut info.jobs {
        job.triggers.sort_by(|a, b| a.key.cmp(&b.key));
        let trigger_count = job.triggers.len();
        job.triggers
            .dedup_by(|later, earlier| later.key == earlier.key);
        if job.triggers.len() != trigger_count {
            warn!(
                job_key = %job.key,
                dropped = trigger_count - job.triggers.len(),
                "Scheduler reported duplicate trigger keys"
            );
        }

        for trigger in job.triggers.iter().filter(|t| !t.timestamps_consistent()) {
            warn!(
                job_key = %job.key,
                trigger_key = %trigger.key,
                previous_fire_time = ?trigger.previous_fire_time,
                next_fire_time = ?trigger.next_fire_time,
                "Trigger previous fire time is after its next fire time"
            );
        }
    }

    info
}

/// Service handle over an injected metadata source
#[derive(Clone)]
pub struct JobInfoService {
    source: Arc<dyn JobInfoSource>,
}

impl std::fmt::Debug for JobInfoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobInfoService")
            .field("source", &self.source.name())
            .finish()
    }
}

impl JobInfoService {
    pub fn new(source: Arc<dyn JobInfoSource>) -> Self {
        Self { source }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Full snapshot: every job with its triggers
    #[instrument(skip(self))]
    pub async fn scheduler_info(&self) -> Result<SchedulerInfo, JobInfoError> {
        let started = Instant::now();
        let result = self.source.fetch_scheduler_info().await.map(normalize);
        record("scheduler_info", &result, started, |_| QueryOutcome::Success);
        result
    }

    /// Triggers for one job; empty for unknown jobs
    #[instrument(skip(self))]
    pub async fn get_job_triggers(&self, job_key: &str) -> Result<Vec<Trigger>, JobInfoError> {
        let started = Instant::now();
        let result = get_job_triggers(self.source.as_ref(), job_key).await;
        record("get_job_triggers", &result, started, |triggers| {
            telemetry::record_triggers_returned(triggers.len());
            if triggers.is_empty() {
                QueryOutcome::Empty
            } else {
                QueryOutcome::Success
            }
        });
        result
    }

    /// One job with its triggers; `JobNotFound` when the scheduler has no such job
    #[instrument(skip(self))]
    pub async fn get_job(&self, job_key: &str) -> Result<JobInfo, JobInfoError> {
        let started = Instant::now();
        let result = self.find_job(job_key).await;
        record("get_job", &result, started, |_| QueryOutcome::Success);
        result
    }

    async fn find_job(&self, job_key: &str) -> Result<JobInfo, JobInfoError> {
        let job_key = validate_job_key(job_key)?;
        let info = normalize(self.source.fetch_job_info(job_key).await?);
        info.jobs
            .into_iter()
            .find(|job| job.key == job_key)
            .ok_or_else(|| JobInfoError::JobNotFound(job_key.to_string()))
    }

    pub async fn health_check(&self) -> Result<(), JobInfoError> {
        self.source.health_check().await
    }

    pub async fn shutdown(&self) {
        self.source.shutdown().await;
    }
}

fn record<T>(
    operation: &'static str,
    result: &Result<T, JobInfoError>,
    started: Instant,
    on_success: impl FnOnce(&T) -> QueryOutcome,
) {
    let outcome = match result {
        Ok(value) => on_success(value),
        Err(err) => {
            warn!(operation = operation, error = %err, "Job info query failed");
            outcome_for_error(err)
        }
    };
    telemetry::record_query(operation, outcome, started.elapsed().as_secs_f64());
}

fn outcome_for_error(err: &JobInfoError) -> QueryOutcome {
    match err {
        JobInfoError::InvalidJobKey(_) => QueryOutcome::Invalid,
        JobInfoError::JobNotFound(_) => QueryOutcome::NotFound,
        JobInfoError::UpstreamUnavailable(_) => QueryOutcome::Unavailable,
        JobInfoError::MalformedMetadata(_) => QueryOutcome::Malformed,
    }
}
