use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use common::auth::JwtService;
use common::config::Settings;
use common::job_info::JobInfoService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub job_info: JobInfoService,
    pub jwt: JwtService,
    pub metrics_handle: PrometheusHandle,
    pub config: Arc<Settings>,
}

impl AppState {
    /// Create a new AppState instance
    pub fn new(job_info: JobInfoService, metrics_handle: PrometheusHandle, config: Settings) -> Self {
        let jwt = JwtService::new(&config.auth.jwt_secret, config.auth.jwt_expiration_hours);

        Self {
            job_info,
            jwt,
            metrics_handle,
            config: Arc::new(config),
        }
    }
}
