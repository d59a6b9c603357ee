use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::str::FromStr;

// ============================================================================
// Scheduler Snapshot Models
// ============================================================================

/// Snapshot of the external scheduler: summary lines plus every job it knows
///
/// `jobs` is required when decoding, so a body of some other shape is
/// rejected instead of read as a scheduler with no jobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerInfo {
    #[serde(default)]
    pub scheduler: Vec<String>,
    pub jobs: Vec<JobInfo>,
}

impl SchedulerInfo {
    /// Look up a job by key
    pub fn job(&self, job_key: &str) -> Option<&JobInfo> {
        self.jobs.iter().find(|job| job.key == job_key)
    }
}

/// JobInfo describes one job registered with the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobInfo {
    pub key: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "concurrent-execution-disallowed?", default)]
    pub concurrent_execution_disallowed: bool,
    #[serde(rename = "durable?", default)]
    pub durable: bool,
    #[serde(rename = "requests-recovery?", default)]
    pub requests_recovery: bool,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

impl JobInfo {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            class: None,
            description: None,
            concurrent_execution_disallowed: false,
            durable: false,
            requests_recovery: false,
            triggers: Vec::new(),
        }
    }

    pub fn with_triggers(mut self, triggers: Vec<Trigger>) -> Self {
        self.triggers = triggers;
        self
    }
}

/// Trigger is a firing rule attached to exactly one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Trigger {
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
    pub state: TriggerState,
    pub priority: i32,
    #[serde(default)]
    pub previous_fire_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_fire_time: Option<DateTime<Utc>>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub final_fire_time: Option<DateTime<Utc>>,
    #[serde(rename = "may-fire-again?")]
    pub may_fire_again: bool,
    pub misfire_instruction: MisfireInstruction,
    /// Cron expression, only present for cron triggers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, serde_json::Value>,
}

/// Quartz default priority for triggers that do not set one
pub const DEFAULT_TRIGGER_PRIORITY: i32 = 5;

impl Trigger {
    /// Create a trigger with no fire times and the smart misfire policy
    pub fn new(key: impl Into<String>, state: TriggerState, start_time: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            description: None,
            state,
            priority: DEFAULT_TRIGGER_PRIORITY,
            previous_fire_time: None,
            next_fire_time: None,
            start_time,
            end_time: None,
            final_fire_time: None,
            may_fire_again: false,
            misfire_instruction: MisfireInstruction::SmartPolicy,
            schedule: None,
            timezone: None,
            data: BTreeMap::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the next fire time; a trigger with a next fire time may fire again
    pub fn with_next_fire_time(mut self, next: Option<DateTime<Utc>>) -> Self {
        self.next_fire_time = next;
        self.may_fire_again = next.is_some();
        self
    }

    pub fn with_previous_fire_time(mut self, previous: Option<DateTime<Utc>>) -> Self {
        self.previous_fire_time = previous;
        self
    }

    /// Previous fire must not be after next fire when both are known
    pub fn timestamps_consistent(&self) -> bool {
        match (self.previous_fire_time, self.next_fire_time) {
            (Some(previous), Some(next)) => previous <= next,
            _ => true,
        }
    }
}

// ============================================================================
// Trigger State
// ============================================================================

/// TriggerState is the state the scheduler reports for a trigger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerState {
    None,
    Normal,
    Paused,
    Complete,
    Error,
    Blocked,
}

impl TriggerState {
    /// Map a raw `trigger_state` column value from the Quartz JDBC store
    ///
    /// Waiting, acquired and executing triggers are all "normal" from the
    /// outside; deleted or unrecognised states collapse to `None`.
    pub fn from_quartz(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "WAITING" | "ACQUIRED" | "EXECUTING" => TriggerState::Normal,
            "PAUSED" | "PAUSED_BLOCKED" => TriggerState::Paused,
            "COMPLETE" => TriggerState::Complete,
            "ERROR" => TriggerState::Error,
            "BLOCKED" => TriggerState::Blocked,
            _ => TriggerState::None,
        }
    }
}

impl std::fmt::Display for TriggerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerState::None => write!(f, "NONE"),
            TriggerState::Normal => write!(f, "NORMAL"),
            TriggerState::Paused => write!(f, "PAUSED"),
            TriggerState::Complete => write!(f, "COMPLETE"),
            TriggerState::Error => write!(f, "ERROR"),
            TriggerState::Blocked => write!(f, "BLOCKED"),
        }
    }
}

impl FromStr for TriggerState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(TriggerState::None),
            "NORMAL" => Ok(TriggerState::Normal),
            "PAUSED" => Ok(TriggerState::Paused),
            "COMPLETE" => Ok(TriggerState::Complete),
            "ERROR" => Ok(TriggerState::Error),
            "BLOCKED" => Ok(TriggerState::Blocked),
            _ => Err(format!("Invalid trigger state: {}", s)),
        }
    }
}

// ============================================================================
// Trigger Kind & Misfire Instruction
// ============================================================================

/// TriggerKind is the raw `trigger_type` of a Quartz trigger row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Cron,
    Simple,
    Other,
}

impl TriggerKind {
    pub fn from_quartz(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CRON" => TriggerKind::Cron,
            "SIMPLE" => TriggerKind::Simple,
            _ => TriggerKind::Other,
        }
    }
}

/// MisfireInstruction is the policy applied when a trigger misses its fire time
///
/// Codes 1 and 2 mean different things for cron and simple triggers, so the
/// kind is needed to decode them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MisfireInstruction {
    IgnoreMisfirePolicy,
    SmartPolicy,
    FireOnceNow,
    DoNothing,
    FireNow,
    RescheduleNowWithExistingRepeatCount,
    RescheduleNowWithRemainingRepeatCount,
    RescheduleNextWithRemainingCount,
    RescheduleNextWithExistingCount,
    Unknown(i16),
}

impl MisfireInstruction {
    pub fn from_code(kind: TriggerKind, code: i16) -> Self {
        match (kind, code) {
            (_, -1) => MisfireInstruction::IgnoreMisfirePolicy,
            (_, 0) => MisfireInstruction::SmartPolicy,
            (TriggerKind::Cron, 1) => MisfireInstruction::FireOnceNow,
            (TriggerKind::Cron, 2) => MisfireInstruction::DoNothing,
            (TriggerKind::Simple, 1) => MisfireInstruction::FireNow,
            (TriggerKind::Simple, 2) => MisfireInstruction::RescheduleNowWithExistingRepeatCount,
            (TriggerKind::Simple, 3) => MisfireInstruction::RescheduleNowWithRemainingRepeatCount,
            (TriggerKind::Simple, 4) => MisfireInstruction::RescheduleNextWithRemainingCount,
            (TriggerKind::Simple, 5) => MisfireInstruction::RescheduleNextWithExistingCount,
            (_, other) => MisfireInstruction::Unknown(other),
        }
    }
}

const UNKNOWN_MISFIRE_PREFIX: &str = "UNKNOWN: ";

impl std::fmt::Display for MisfireInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MisfireInstruction::IgnoreMisfirePolicy => "MISFIRE_INSTRUCTION_IGNORE_MISFIRE_POLICY",
            MisfireInstruction::SmartPolicy => "MISFIRE_INSTRUCTION_SMART_POLICY",
            MisfireInstruction::FireOnceNow => "MISFIRE_INSTRUCTION_FIRE_ONCE_NOW",
            MisfireInstruction::DoNothing => "MISFIRE_INSTRUCTION_DO_NOTHING",
            MisfireInstruction::FireNow => "MISFIRE_INSTRUCTION_FIRE_NOW",
            MisfireInstruction::RescheduleNowWithExistingRepeatCount => {
                "MISFIRE_INSTRUCTION_RESCHEDULE_NOW_WITH_EXISTING_REPEAT_COUNT"
            }
            MisfireInstruction::RescheduleNowWithRemainingRepeatCount => {
                "MISFIRE_INSTRUCTION_RESCHEDULE_NOW_WITH_REMAINING_REPEAT_COUNT"
            }
            MisfireInstruction::RescheduleNextWithRemainingCount => {
                "MISFIRE_INSTRUCTION_RESCHEDULE_NEXT_WITH_REMAINING_COUNT"
            }
            MisfireInstruction::RescheduleNextWithExistingCount => {
                "MISFIRE_INSTRUCTION_RESCHEDULE_NEXT_WITH_EXISTING_COUNT"
            }
            MisfireInstruction::Unknown(code) => {
                return write!(f, "{}{}", UNKNOWN_MISFIRE_PREFIX, code)
            }
        };
        f.write_str(name)
    }
}

impl FromStr for MisfireInstruction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MISFIRE_INSTRUCTION_IGNORE_MISFIRE_POLICY" => Ok(MisfireInstruction::IgnoreMisfirePolicy),
            "MISFIRE_INSTRUCTION_SMART_POLICY" => Ok(MisfireInstruction::SmartPolicy),
            "MISFIRE_INSTRUCTION_FIRE_ONCE_NOW" => Ok(MisfireInstruction::FireOnceNow),
            "MISFIRE_INSTRUCTION_DO_NOTHING" => Ok(MisfireInstruction::DoNothing),
            "MISFIRE_INSTRUCTION_FIRE_NOW" => Ok(MisfireInstruction::FireNow),
            "MISFIRE_INSTRUCTION_RESCHEDULE_NOW_WITH_EXISTING_REPEAT_COUNT" => {
                Ok(MisfireInstruction::RescheduleNowWithExistingRepeatCount)
            }
            "MISFIRE_INSTRUCTION_RESCHEDULE_NOW_WITH_REMAINING_REPEAT_COUNT" => {
                Ok(MisfireInstruction::RescheduleNowWithRemainingRepeatCount)
            }
            "MISFIRE_INSTRUCTION_RESCHEDULE_NEXT_WITH_REMAINING_COUNT" => {
                Ok(MisfireInstruction::RescheduleNextWithRemainingCount)
            }
            "MISFIRE_INSTRUCTION_RESCHEDULE_NEXT_WITH_EXISTING_COUNT" => {
                Ok(MisfireInstruction::RescheduleNextWithExistingCount)
            }
            other => other
                .strip_prefix(UNKNOWN_MISFIRE_PREFIX)
                .and_then(|code| code.trim().parse::<i16>().ok())
                .map(MisfireInstruction::Unknown)
                .ok_or_else(|| format!("Invalid misfire instruction: {}", s)),
        }
    }
}

impl Serialize for MisfireInstruction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MisfireInstruction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MisfireInstruction::from_str(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Auth Models
// ============================================================================

/// UserClaims represents JWT token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,       // Subject (user ID)
    pub username: String,  // Username
    #[serde(default)]
    pub is_superuser: bool,
    pub exp: i64,          // Expiration time (Unix timestamp)
    pub iat: i64,          // Issued at (Unix timestamp)
}
