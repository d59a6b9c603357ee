use crate::errors::JobInfoError;
use crate::models::SchedulerInfo;
use crate::source::JobInfoSource;
use async_trait::async_trait;
use std::path::Path;

/// Source serving a fixed snapshot held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticJobInfoSource {
    snapshot: SchedulerInfo,
}

impl StaticJobInfoSource {
    pub fn new(snapshot: SchedulerInfo) -> Self {
        Self { snapshot }
    }

    /// Load a snapshot previously exported as JSON
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, JobInfoError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            JobInfoError::UpstreamUnavailable(format!(
                "Failed to read snapshot {}: {}",
                path.display(),
                e
            ))
        })?;
        let snapshot = serde_json::from_str(&contents).map_err(|e| {
            JobInfoError::MalformedMetadata(format!("{}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), "Loaded scheduler snapshot file");
        Ok(Self::new(snapshot))
    }
}

#[async_trait]
impl JobInfoSource for StaticJobInfoSource {
    async fn fetch_scheduler_info(&self) -> Result<SchedulerInfo, JobInfoError> {
        Ok(self.snapshot.clone())
    }

    async fn health_check(&self) -> Result<(), JobInfoError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "snapshot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_snapshot_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "scheduler": ["Quartz Scheduler (v2.3.2)"],
                "jobs": [{{
                    "key": "sync-job",
                    "durable?": true,
                    "triggers": [{{
                        "key": "t1",
                        "state": "NORMAL",
                        "priority": 5,
                        "start-time": "2024-03-01T00:00:00Z",
                        "may-fire-again?": true,
                        "misfire-instruction": "MISFIRE_INSTRUCTION_SMART_POLICY"
                    }}]
                }}]
            }}"#
        )
        .unwrap();

        let source = StaticJobInfoSource::from_json_file(file.path()).unwrap();
        let info = source.fetch_scheduler_info().await.unwrap();
        let job = info.job("sync-job").unwrap();
        assert!(job.durable);
        assert_eq!(job.triggers[0].key, "t1");
        assert!(job.triggers[0].may_fire_again);
    }

    #[test]
    fn test_missing_snapshot_file() {
        let result = StaticJobInfoSource::from_json_file("/nonexistent/snapshot.json");
        assert!(matches!(result, Err(JobInfoError::UpstreamUnavailable(_))));
    }

    #[test]
    fn test_malformed_snapshot_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let result = StaticJobInfoSource::from_json_file(file.path());
        assert!(matches!(result, Err(JobInfoError::MalformedMetadata(_))));
    }
}
