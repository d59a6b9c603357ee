// Property-based tests for the job info query and models

use chrono::{TimeZone, Utc};
use common::config::{Settings, SourceKind};
use common::job_info::{get_job_triggers, normalize};
use common::models::{
    JobInfo, MisfireInstruction, SchedulerInfo, Trigger, TriggerKind, TriggerState,
};
use common::source::StaticJobInfoSource;
use proptest::prelude::*;
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

fn trigger_state() -> impl Strategy<Value = TriggerState> {
    prop::sample::select(vec![
        TriggerState::None,
        TriggerState::Normal,
        TriggerState::Paused,
        TriggerState::Complete,
        TriggerState::Error,
        TriggerState::Blocked,
    ])
}

fn start_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

/// *For any* trigger, `may-fire-again?` serializes as a JSON boolean and
/// deserializes back to the same value.
#[test]
fn property_may_fire_again_round_trips() {
    proptest!(|(may_fire_again in any::<bool>(), state in trigger_state(), priority in -10i32..10)| {
        let mut trigger = Trigger::new("t", state, start_time()).with_priority(priority);
        trigger.may_fire_again = may_fire_again;

        let json = serde_json::to_value(&trigger).unwrap();
        prop_assert_eq!(&json["may-fire-again?"], &serde_json::Value::Bool(may_fire_again));

        let back: Trigger = serde_json::from_value(json).unwrap();
        prop_assert_eq!(back.may_fire_again, may_fire_again);
        prop_assert_eq!(back, trigger);
    });
}

/// *For any* job whose trigger list may contain repeated keys, the query
/// returns exactly one record per distinct key.
#[test]
fn property_one_record_per_trigger_key() {
    proptest!(|(keys in prop::collection::vec("[a-z]{1,3}", 0..20))| {
        let triggers = keys
            .iter()
            .map(|key| Trigger::new(key.clone(), TriggerState::Normal, start_time()))
            .collect();
        let source = StaticJobInfoSource::new(SchedulerInfo {
            scheduler: Vec::new(),
            jobs: vec![JobInfo::new("sync-job").with_triggers(triggers)],
        });

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(get_job_triggers(&source, "sync-job")).unwrap();

        let returned: Vec<_> = result.iter().map(|t| t.key.clone()).collect();
        let unique: HashSet<_> = returned.iter().cloned().collect();
        prop_assert_eq!(returned.len(), unique.len());

        let expected: HashSet<_> = keys.into_iter().collect();
        prop_assert_eq!(unique, expected);
    });
}

/// *For any* job key not present in the snapshot, the query returns an empty
/// list rather than an error.
#[test]
fn property_unknown_job_is_empty() {
    proptest!(|(job_key in "[a-z-]{1,20}")| {
        prop_assume!(job_key != "sync-job");
        let source = StaticJobInfoSource::new(SchedulerInfo {
            scheduler: Vec::new(),
            jobs: vec![JobInfo::new("sync-job").with_triggers(vec![
                Trigger::new("t1", TriggerState::Normal, start_time()),
            ])],
        });

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(get_job_triggers(&source, &job_key));
        prop_assert!(matches!(result, Ok(ref triggers) if triggers.is_empty()));
    });
}

/// *For any* snapshot, normalizing twice gives the same result as normalizing once.
#[test]
fn property_normalize_is_idempotent() {
    proptest!(|(
        job_keys in prop::collection::vec("[a-c]{1,2}", 0..8),
        trigger_keys in prop::collection::vec("[a-c]{1,2}", 0..8),
    )| {
        let jobs = job_keys
            .iter()
            .map(|key| {
                JobInfo::new(key.clone()).with_triggers(
                    trigger_keys
                        .iter()
                        .map(|t| Trigger::new(t.clone(), TriggerState::Normal, start_time()))
                        .collect(),
                )
            })
            .collect();
        let once = normalize(SchedulerInfo { scheduler: Vec::new(), jobs });
        let twice = normalize(once.clone());
        prop_assert_eq!(once, twice);
    });
}

/// *For any* kind and code, the misfire instruction text parses back to the
/// same instruction.
#[test]
fn property_misfire_instruction_text_round_trips() {
    proptest!(|(
        code in -3i16..12,
        kind in prop::sample::select(vec![TriggerKind::Cron, TriggerKind::Simple, TriggerKind::Other]),
    )| {
        let instruction = MisfireInstruction::from_code(kind, code);
        let parsed: MisfireInstruction = instruction.to_string().parse().unwrap();
        prop_assert_eq!(parsed, instruction);
    });
}

#[test]
fn test_settings_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("default.toml"),
        r#"
[server]
host = "127.0.0.1"
port = 3000

[source]
kind = "http"

[source.http]
base_url = "http://metabase.internal:3000"
api_token = "token"

[auth]
jwt_secret = "test-secret"
jwt_expiration_hours = 12

[observability]
log_level = "debug"
"#,
    )
    .unwrap();

    let settings = Settings::load_from_path(temp_dir.path()).unwrap();
    assert_eq!(settings.server.port, 3000);
    assert_eq!(settings.source.kind, SourceKind::Http);
    assert_eq!(settings.source.scheduler_name, "MetabaseScheduler");
    assert_eq!(settings.source.table_prefix, "qrtz_");
    let http = settings.source.http.as_ref().unwrap();
    assert_eq!(http.timeout_seconds, 10);
    assert!(settings.auth.enabled);
    assert!(settings.validate().is_ok());
}
