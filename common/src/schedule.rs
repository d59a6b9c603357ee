// Final fire time calculation for scheduler triggers
//
// The Quartz JDBC store persists start, end, next and previous fire times but
// not the final fire time, so it is derived here from the trigger's schedule.

use crate::errors::ScheduleError;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use std::str::FromStr;

/// Upper bound on cron iterations when searching for the last fire before an end time
pub const MAX_CRON_STEPS: usize = 100_000;

/// Simple trigger repeat count meaning "repeat forever"
pub const REPEAT_INDEFINITELY: i64 = -1;

/// TriggerSchedule is the kind-specific part of a trigger definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerSchedule {
    Cron {
        expression: String,
        timezone: Option<String>,
    },
    Simple {
        repeat_count: i64,
        repeat_interval_ms: i64,
    },
    Other,
}

impl TriggerSchedule {
    /// Calculate the last time this trigger will fire
    ///
    /// `next_fire` is used as the search origin for cron triggers when known,
    /// otherwise the start time is.
    pub fn final_fire_time(
        &self,
        start: DateTime<Utc>,
        next_fire: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Option<DateTime<Utc>>, ScheduleError> {
        match self {
            TriggerSchedule::Cron {
                expression,
                timezone,
            } => cron_final_fire_time(
                expression,
                timezone.as_deref(),
                next_fire.unwrap_or(start),
                end,
            ),
            TriggerSchedule::Simple {
                repeat_count,
                repeat_interval_ms,
            } => Ok(simple_final_fire_time(
                start,
                end,
                *repeat_count,
                *repeat_interval_ms,
            )),
            TriggerSchedule::Other => Ok(None),
        }
    }
}

/// Parse a Quartz cron expression
///
/// Quartz uses `?` for "no specific value" in the day fields; it is read as `*`.
pub fn parse_cron_expression(expression: &str) -> Result<CronSchedule, ScheduleError> {
    let normalized = expression.replace('?', "*");
    CronSchedule::from_str(&normalized).map_err(|e| ScheduleError::InvalidCronExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an IANA time zone id, defaulting to UTC when absent
pub fn parse_timezone(timezone: Option<&str>) -> Result<Tz, ScheduleError> {
    match timezone.map(str::trim) {
        None | Some("") => Ok(Tz::UTC),
        Some(id) => Tz::from_str(id).map_err(|_| ScheduleError::InvalidTimezone(id.to_string())),
    }
}

/// Last cron fire time at or before `end`, searching forward from `from`
pub fn cron_final_fire_time(
    expression: &str,
    timezone: Option<&str>,
    from: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<Option<DateTime<Utc>>, ScheduleError> {
    let schedule = parse_cron_expression(expression)?;
    let tz = parse_timezone(timezone)?;

    let Some(end) = end else {
        return Ok(None);
    };
    if from > end {
        return Ok(None);
    }

    // `after` is exclusive, so start one second early to include `from` itself
    let origin = (from - Duration::seconds(1)).with_timezone(&tz);
    let mut last = None;
    for (step, fire) in schedule.after(&origin).enumerate() {
        if step >= MAX_CRON_STEPS {
            tracing::debug!(
                expression = expression,
                max_steps = MAX_CRON_STEPS,
                "Cron final fire time search exceeded step limit"
            );
            return Ok(None);
        }
        let fire = fire.with_timezone(&Utc);
        if fire > end {
            break;
        }
        last = Some(fire);
    }

    Ok(last)
}

/// Final fire time of a simple (fixed interval) trigger
pub fn simple_final_fire_time(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    repeat_count: i64,
    repeat_interval_ms: i64,
) -> Option<DateTime<Utc>> {
    if repeat_count == 0 || repeat_interval_ms <= 0 {
        return Some(start);
    }

    let fire_at_or_before = |end: DateTime<Utc>| -> Option<DateTime<Utc>> {
        if end < start {
            return None;
        }
        let fires = (end - start).num_milliseconds() / repeat_interval_ms;
        start.checked_add_signed(Duration::milliseconds(fires * repeat_interval_ms))
    };

    if repeat_count <= REPEAT_INDEFINITELY {
        return end.and_then(fire_at_or_before);
    }

    let last_by_count = start.checked_add_signed(Duration::milliseconds(
        repeat_count.saturating_mul(repeat_interval_ms),
    ));

    match (last_by_count, end) {
        (Some(last), Some(end)) if last >= end => fire_at_or_before(end),
        (Some(last), _) => Some(last),
        (None, Some(end)) => fire_at_or_before(end),
        (None, None) => None,
    }
}
