// Quartz JDBC job store repository
//
// Reads job details and triggers for one scheduler instance and assembles
// them into a SchedulerInfo snapshot. Never writes.

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{
    JobInfo, MisfireInstruction, SchedulerInfo, Trigger, TriggerKind, TriggerState,
    DEFAULT_TRIGGER_PRIORITY,
};
use crate::schedule::TriggerSchedule;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::{instrument, warn};

/// Fully qualified Quartz table names for a given prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuartzTables {
    pub job_details: String,
    pub triggers: String,
    pub cron_triggers: String,
    pub simple_triggers: String,
}

impl QuartzTables {
    /// Build table names from a prefix such as `qrtz_`
    ///
    /// Table names cannot be bound as query parameters, so the prefix is
    /// restricted to a plain SQL identifier.
    pub fn new(prefix: &str) -> Result<Self, DatabaseError> {
        let mut chars = prefix.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if !valid {
            return Err(DatabaseError::InvalidTablePrefix(prefix.to_string()));
        }

        Ok(Self {
            job_details: format!("{}job_details", prefix),
            triggers: format!("{}triggers", prefix),
            cron_triggers: format!("{}cron_triggers", prefix),
            simple_triggers: format!("{}simple_triggers", prefix),
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobDetailRow {
    pub job_name: String,
    pub job_group: String,
    pub description: Option<String>,
    pub job_class_name: String,
    pub is_durable: bool,
    pub is_nonconcurrent: bool,
    pub requests_recovery: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TriggerRow {
    pub trigger_name: String,
    pub trigger_group: String,
    pub job_name: String,
    pub job_group: String,
    pub description: Option<String>,
    pub next_fire_time: Option<i64>,
    pub prev_fire_time: Option<i64>,
    pub priority: Option<i32>,
    pub trigger_state: String,
    pub trigger_type: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub misfire_instr: Option<i16>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CronTriggerRow {
    pub trigger_name: String,
    pub trigger_group: String,
    pub cron_expression: String,
    pub time_zone_id: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SimpleTriggerRow {
    pub trigger_name: String,
    pub trigger_group: String,
    pub repeat_count: i64,
    pub repeat_interval: i64,
}

type TriggerId = (String, String);

/// Repository for reading the Quartz job store
pub struct QuartzRepository {
    pool: DbPool,
    scheduler_name: String,
    tables: QuartzTables,
}

impl QuartzRepository {
    pub fn new(
        pool: DbPool,
        scheduler_name: impl Into<String>,
        table_prefix: &str,
    ) -> Result<Self, DatabaseError> {
        Ok(Self {
            pool,
            scheduler_name: scheduler_name.into(),
            tables: QuartzTables::new(table_prefix)?,
        })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Load every job of this scheduler together with its triggers
    ///
    /// The four tables are read concurrently; the snapshot is therefore not
    /// transactional, which matches what a reader of a live scheduler sees
    /// anyway.
    #[instrument(skip(self), fields(scheduler_name = %self.scheduler_name))]
    pub async fn load_snapshot(&self) -> Result<SchedulerInfo, DatabaseError> {
        self.load(None).await
    }

    /// Load only the jobs named `job_key` and their triggers
    #[instrument(skip(self), fields(scheduler_name = %self.scheduler_name))]
    pub async fn load_job(&self, job_key: &str) -> Result<SchedulerInfo, DatabaseError> {
        self.load(Some(job_key)).await
    }

    async fn load(&self, job_key: Option<&str>) -> Result<SchedulerInfo, DatabaseError> {
        let (jobs, triggers, cron_triggers, simple_triggers) = futures::try_join!(
            self.fetch_job_details(job_key),
            self.fetch_triggers(job_key),
            self.fetch_cron_triggers(job_key),
            self.fetch_simple_triggers(job_key),
        )?;

        tracing::debug!(
            jobs = jobs.len(),
            triggers = triggers.len(),
            "Loaded job store rows"
        );

        Ok(assemble_snapshot(
            &self.scheduler_name,
            &self.tables,
            jobs,
            triggers,
            cron_triggers,
            simple_triggers,
        ))
    }

    async fn fetch_job_details(
        &self,
        job_key: Option<&str>,
    ) -> Result<Vec<JobDetailRow>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT
                job_name, job_group, description, job_class_name,
                is_durable, is_nonconcurrent, requests_recovery
            FROM {}
            WHERE sched_name = $1
              AND ($2::text IS NULL OR job_name = $2)
            "#,
            self.tables.job_details
        );
        let rows = sqlx::query_as::<_, JobDetailRow>(&sql)
            .bind(&self.scheduler_name)
            .bind(job_key)
            .fetch_all(self.pool.pool())
            .await?;
        Ok(rows)
    }

    async fn fetch_triggers(&self, job_key: Option<&str>) -> Result<Vec<TriggerRow>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT
                trigger_name, trigger_group, job_name, job_group, description,
                next_fire_time, prev_fire_time, priority, trigger_state,
                trigger_type, start_time, end_time, misfire_instr
            FROM {}
            WHERE sched_name = $1
              AND ($2::text IS NULL OR job_name = $2)
            "#,
            self.tables.triggers
        );
        let rows = sqlx::query_as::<_, TriggerRow>(&sql)
            .bind(&self.scheduler_name)
            .bind(job_key)
            .fetch_all(self.pool.pool())
            .await?;
        Ok(rows)
    }

    async fn fetch_cron_triggers(
        &self,
        job_key: Option<&str>,
    ) -> Result<Vec<CronTriggerRow>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT c.trigger_name, c.trigger_group, c.cron_expression, c.time_zone_id
            FROM {} c
            JOIN {} t
              ON t.sched_name = c.sched_name
             AND t.trigger_name = c.trigger_name
             AND t.trigger_group = c.trigger_group
            WHERE c.sched_name = $1
              AND ($2::text IS NULL OR t.job_name = $2)
            "#,
            self.tables.cron_triggers, self.tables.triggers
        );
        let rows = sqlx::query_as::<_, CronTriggerRow>(&sql)
            .bind(&self.scheduler_name)
            .bind(job_key)
            .fetch_all(self.pool.pool())
            .await?;
        Ok(rows)
    }

    async fn fetch_simple_triggers(
        &self,
        job_key: Option<&str>,
    ) -> Result<Vec<SimpleTriggerRow>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT s.trigger_name, s.trigger_group, s.repeat_count, s.repeat_interval
            FROM {} s
            JOIN {} t
              ON t.sched_name = s.sched_name
             AND t.trigger_name = s.trigger_name
             AND t.trigger_group = s.trigger_group
            WHERE s.sched_name = $1
              AND ($2::text IS NULL OR t.job_name = $2)
            "#,
            self.tables.simple_triggers, self.tables.triggers
        );
        let rows = sqlx::query_as::<_, SimpleTriggerRow>(&sql)
            .bind(&self.scheduler_name)
            .bind(job_key)
            .fetch_all(self.pool.pool())
            .await?;
        Ok(rows)
    }
}

/// Assemble job store rows into a snapshot
pub fn assemble_snapshot(
    scheduler_name: &str,
    tables: &QuartzTables,
    jobs: Vec<JobDetailRow>,
    triggers: Vec<TriggerRow>,
    cron_triggers: Vec<CronTriggerRow>,
    simple_triggers: Vec<SimpleTriggerRow>,
) -> SchedulerInfo {
    let cron_by_id: HashMap<TriggerId, CronTriggerRow> = cron_triggers
        .into_iter()
        .map(|row| ((row.trigger_name.clone(), row.trigger_group.clone()), row))
        .collect();
    let simple_by_id: HashMap<TriggerId, SimpleTriggerRow> = simple_triggers
        .into_iter()
        .map(|row| ((row.trigger_name.clone(), row.trigger_group.clone()), row))
        .collect();

    let trigger_count = triggers.len();
    let mut triggers_by_job: HashMap<(String, String), Vec<Trigger>> = HashMap::new();
    for row in triggers {
        let id = (row.trigger_name.clone(), row.trigger_group.clone());
        let schedule = match TriggerKind::from_quartz(&row.trigger_type) {
            TriggerKind::Cron => cron_by_id
                .get(&id)
                .map(|cron| TriggerSchedule::Cron {
                    expression: cron.cron_expression.clone(),
                    timezone: cron.time_zone_id.clone(),
                })
                .unwrap_or(TriggerSchedule::Other),
            TriggerKind::Simple => simple_by_id
                .get(&id)
                .map(|simple| TriggerSchedule::Simple {
                    repeat_count: simple.repeat_count,
                    repeat_interval_ms: simple.repeat_interval,
                })
                .unwrap_or(TriggerSchedule::Other),
            TriggerKind::Other => TriggerSchedule::Other,
        };

        let job_id = (row.job_name.clone(), row.job_group.clone());
        triggers_by_job
            .entry(job_id)
            .or_default()
            .push(build_trigger(row, &schedule));
    }

    let job_count = jobs.len();
    let jobs = jobs
        .into_iter()
        .map(|row| {
            let triggers = triggers_by_job
                .remove(&(row.job_name.clone(), row.job_group.clone()))
                .unwrap_or_default();
            JobInfo {
                key: row.job_name,
                class: Some(simple_class_name(&row.job_class_name).to_string()),
                description: row.description,
                concurrent_execution_disallowed: row.is_nonconcurrent,
                durable: row.is_durable,
                requests_recovery: row.requests_recovery,
                triggers,
            }
        })
        .collect();

    for ((job_name, job_group), orphans) in &triggers_by_job {
        warn!(
            job_name = %job_name,
            job_group = %job_group,
            triggers = orphans.len(),
            "Triggers reference a job missing from the job store"
        );
    }

    SchedulerInfo {
        scheduler: vec![
            format!("Scheduler '{}' read from Quartz JDBC job store", scheduler_name),
            format!("Tables: {}, {}", tables.job_details, tables.triggers),
            format!("Jobs: {}", job_count),
            format!("Triggers: {}", trigger_count),
        ],
        jobs,
    }
}

/// Build an API trigger record from a `triggers` row
pub fn build_trigger(row: TriggerRow, schedule: &TriggerSchedule) -> Trigger {
    let kind = TriggerKind::from_quartz(&row.trigger_type);
    let next_fire_time = row.next_fire_time.and_then(fire_time_from_millis);
    let previous_fire_time = row.prev_fire_time.and_then(fire_time_from_millis);
    let end_time = row.end_time.filter(|ms| *ms > 0).and_then(fire_time_from_millis);
    let start_time = DateTime::from_timestamp_millis(row.start_time).unwrap_or_default();

    let final_fire_time = schedule
        .final_fire_time(start_time, next_fire_time, end_time)
        .unwrap_or_else(|e| {
            warn!(
                trigger = %row.trigger_name,
                error = %e,
                "Could not compute final fire time"
            );
            None
        });

    let (cron_expression, timezone) = match schedule {
        TriggerSchedule::Cron {
            expression,
            timezone,
        } => (Some(expression.clone()), timezone.clone()),
        _ => (None, None),
    };

    Trigger {
        key: row.trigger_name,
        description: row.description,
        state: TriggerState::from_quartz(&row.trigger_state),
        priority: row.priority.unwrap_or(DEFAULT_TRIGGER_PRIORITY),
        previous_fire_time,
        next_fire_time,
        start_time,
        end_time,
        final_fire_time,
        may_fire_again: next_fire_time.is_some(),
        misfire_instruction: MisfireInstruction::from_code(kind, row.misfire_instr.unwrap_or(0)),
        schedule: cron_expression,
        timezone,
        data: BTreeMap::new(),
    }
}

/// Quartz stores "no fire time" as a negative value
fn fire_time_from_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms < 0 {
        return None;
    }
    DateTime::from_timestamp_millis(ms)
}

/// `metabase.task.sync.SyncJob` -> `SyncJob`
fn simple_class_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}
