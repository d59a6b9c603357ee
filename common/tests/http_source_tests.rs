// Tests for the upstream HTTP metadata source

use common::config::HttpSourceConfig;
use common::errors::JobInfoError;
use common::job_info::JobInfoService;
use common::models::TriggerState;
use common::source::{HttpJobInfoSource, JobInfoSource};
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_for(server: &MockServer, api_token: Option<&str>) -> HttpJobInfoSource {
    HttpJobInfoSource::new(&HttpSourceConfig {
        base_url: format!("{}/", server.uri()),
        api_token: api_token.map(str::to_string),
        timeout_seconds: 5,
    })
    .unwrap()
}

fn task_info_body() -> serde_json::Value {
    serde_json::json!({
        "scheduler": [
            "Quartz Scheduler (v2.3.2) 'MetabaseScheduler' with instanceId 'NON_CLUSTERED'"
        ],
        "jobs": [
            {
                "key": "sync-job",
                "class": "SyncAndAnalyzeDatabase",
                "description": "Sync and analyze",
                "concurrent-execution-disallowed?": true,
                "durable?": true,
                "requests-recovery?": false,
                "triggers": [
                    {
                        "key": "t1",
                        "description": "hourly",
                        "state": "NORMAL",
                        "priority": 5,
                        "previous-fire-time": "2024-03-01T00:00:00Z",
                        "next-fire-time": "2024-03-01T01:00:00Z",
                        "start-time": "2024-02-01T00:00:00Z",
                        "end-time": null,
                        "final-fire-time": null,
                        "may-fire-again?": true,
                        "misfire-instruction": "MISFIRE_INSTRUCTION_DO_NOTHING",
                        "schedule": "0 0 * * * ?",
                        "timezone": "UTC",
                        "data": { "db-id": 1 }
                    },
                    {
                        "key": "t2",
                        "description": null,
                        "state": "PAUSED",
                        "priority": 1,
                        "previous-fire-time": null,
                        "next-fire-time": null,
                        "start-time": "2024-02-01T00:00:00Z",
                        "end-time": null,
                        "final-fire-time": null,
                        "may-fire-again?": false,
                        "misfire-instruction": "UNKNOWN: 9"
                    }
                ]
            }
        ]
    })
}

#[tokio::test]
async fn test_fetches_task_info_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/task/info"))
        .and(header("Authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_info_body()))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server, Some("secret-token"));
    let info = source.fetch_scheduler_info().await.unwrap();

    let job = info.job("sync-job").unwrap();
    assert_eq!(job.class.as_deref(), Some("SyncAndAnalyzeDatabase"));
    assert!(job.concurrent_execution_disallowed);
    assert_eq!(job.triggers.len(), 2);
    assert_eq!(job.triggers[0].data["db-id"], 1);
    server.verify().await;
}

#[tokio::test]
async fn test_sync_job_scenario_through_http_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/task/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_info_body()))
        .mount(&server)
        .await;

    let service = JobInfoService::new(Arc::new(source_for(&server, None)));

    let triggers = service.get_job_triggers("sync-job").await.unwrap();
    let keys: Vec<_> = triggers.iter().map(|t| t.key.as_str()).collect();
    assert_eq!(keys, vec!["t1", "t2"]);
    assert_eq!(triggers[0].state, TriggerState::Normal);
    assert_eq!(triggers[0].priority, 5);
    assert_eq!(triggers[1].state, TriggerState::Paused);
    assert_eq!(triggers[1].priority, 1);
    assert!(!triggers[1].may_fire_again);

    let ghost = service.get_job_triggers("ghost-job").await.unwrap();
    assert!(ghost.is_empty());
}

#[tokio::test]
async fn test_server_error_is_upstream_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/task/info"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = source_for(&server, None).fetch_scheduler_info().await;
    assert!(matches!(result, Err(JobInfoError::UpstreamUnavailable(_))));
}

#[tokio::test]
async fn test_unreachable_upstream_is_upstream_unavailable() {
    let source = HttpJobInfoSource::new(&HttpSourceConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        api_token: None,
        timeout_seconds: 1,
    })
    .unwrap();

    let result = source.fetch_scheduler_info().await;
    assert!(matches!(result, Err(JobInfoError::UpstreamUnavailable(_))));
    assert!(source.health_check().await.is_err());
}

#[tokio::test]
async fn test_garbage_body_is_malformed_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/task/info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = source_for(&server, None).fetch_scheduler_info().await;
    assert!(matches!(result, Err(JobInfoError::MalformedMetadata(_))));
}

#[tokio::test]
async fn test_health_check_hits_task_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/task/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_info_body()))
        .expect(1)
        .mount(&server)
        .await;

    assert!(source_for(&server, None).health_check().await.is_ok());
    server.verify().await;
}

#[tokio::test]
async fn test_body_without_jobs_is_malformed_metadata() {
    let bodies = [
        serde_json::json!({}),
        serde_json::json!({ "error": "unauthorized", "message": "Session expired" }),
        serde_json::json!({ "data": task_info_body() }),
    ];

    for body in bodies {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/task/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let service = JobInfoService::new(Arc::new(source_for(&server, None)));
        let result = service.get_job_triggers("sync-job").await;
        assert!(matches!(result, Err(JobInfoError::MalformedMetadata(_))));
    }
}
