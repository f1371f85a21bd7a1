use crate::engine::features::FeatureSet;
use crate::error::EngineResult;
use crate::model::person::Person;
use crate::model::schedule::{Schedule, ScheduleRow, ScheduleScope};
use crate::store::AttendanceStore;
use chrono::NaiveTime;
use tracing::{debug, warn};

/// Accepted time formats, tried in order: 24-hour first, then 12-hour
/// with meridiem.
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// Pick the single applicable schedule for a person.
///
/// Precedence: schedule bound to the exact section/department, then the
/// grade level, then the default-flagged active schedule, then the
/// synthetic fallback constants. Never fails: an absent schedule table or
/// an empty chain resolves to the fallback.
pub async fn resolve<S: AttendanceStore>(
    store: &S,
    features: &FeatureSet,
    person: &Person,
) -> EngineResult<Schedule> {
    if !features.has_schedule_table {
        return Ok(Schedule::fallback());
    }

    let mut rows = store
        .active_schedules(ScheduleScope::Section, Some(&person.scope_key), features)
        .await?;

    if rows.is_empty() {
        if let Some(grade) = person.grade_level.as_deref() {
            rows = store
                .active_schedules(ScheduleScope::GradeLevel, Some(grade), features)
                .await?;
        }
    }

    if rows.is_empty() {
        rows = store
            .active_schedules(ScheduleScope::Default, None, features)
            .await?;
    }

    match rows.into_iter().next() {
        Some(row) => {
            debug!(schedule_id = row.id, scope = %row.scope_type, "schedule resolved");
            Ok(parse_row(&row))
        }
        None => {
            debug!(person = %person.canonical_id, "no schedule matched, using fallback");
            Ok(Schedule::fallback())
        }
    }
}

/// Parse the six free-text time fields. A field that matches none of the
/// accepted formats falls back to its hard-coded default; the failure is
/// local and never aborts resolution.
fn parse_row(row: &ScheduleRow) -> Schedule {
    let fallback = Schedule::fallback();
    Schedule {
        morning_start: parse_time_or(
            "morning_start",
            row.morning_start.as_deref(),
            fallback.morning_start,
        ),
        morning_end: parse_time_or(
            "morning_end",
            row.morning_end.as_deref(),
            fallback.morning_end,
        ),
        morning_late_after: parse_time_or(
            "morning_late_after",
            row.morning_late_after.as_deref(),
            fallback.morning_late_after,
        ),
        afternoon_start: parse_time_or(
            "afternoon_start",
            row.afternoon_start.as_deref(),
            fallback.afternoon_start,
        ),
        afternoon_end: parse_time_or(
            "afternoon_end",
            row.afternoon_end.as_deref(),
            fallback.afternoon_end,
        ),
        afternoon_late_after: parse_time_or(
            "afternoon_late_after",
            row.afternoon_late_after.as_deref(),
            fallback.afternoon_late_after,
        ),
    }
}

fn parse_time_or(field: &str, raw: Option<&str>, default: NaiveTime) -> NaiveTime {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return default;
    };
    for format in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(raw, format) {
            return time;
        }
    }
    warn!(field, value = raw, "unparsable schedule time, using default");
    default
}
