use crate::config::HttpSourceConfig;
use crate::errors::JobInfoError;
use crate::models::SchedulerInfo;
use crate::source::JobInfoSource;
use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;

/// Path of the scheduler info endpoint on the upstream service
pub const TASK_INFO_PATH: &str = "/api/task/info";

/// Source that reads the snapshot from another service's task info endpoint
#[derive(Debug, Clone)]
pub struct HttpJobInfoSource {
    client: reqwest::Client,
    url: String,
    api_token: Option<String>,
}

impl HttpJobInfoSource {
    pub fn new(config: &HttpSourceConfig) -> Result<Self, JobInfoError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                JobInfoError::UpstreamUnavailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            url: format!("{}{}", config.base_url.trim_end_matches('/'), TASK_INFO_PATH),
            api_token: config.api_token.clone(),
        })
    }

    async fn get(&self) -> Result<reqwest::Response, JobInfoError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %self.url, status = %status, "Upstream task info request failed");
            return Err(JobInfoError::UpstreamUnavailable(format!(
                "{} returned {}",
                self.url, status
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl JobInfoSource for HttpJobInfoSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_scheduler_info(&self) -> Result<SchedulerInfo, JobInfoError> {
        let body = self.get().await?.bytes().await?;
        serde_json::from_slice::<SchedulerInfo>(&body)
            .map_err(|e| JobInfoError::MalformedMetadata(e.to_string()))
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn health_check(&self) -> Result<(), JobInfoError> {
        self.get().await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
