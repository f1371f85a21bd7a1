use crate::engine::features::FeatureSet;
use crate::error::EngineResult;
use crate::model::attendance::{AttendanceRecord, Session};
use crate::model::person::{Person, PersonType};
use crate::store::{AttendanceStore, TimeColumn, WritePlan};
use chrono::{NaiveDate, NaiveTime};

/// Persist a classified scan idempotently.
///
/// Chooses the concrete time-in column for the deployment (session-specific
/// when the schema has those columns, the single generic `time_in`
/// otherwise), then hands the store an atomic insert-or-fill plan. A slot
/// that already holds a value is never overwritten; the stored value comes
/// back with `was_new = false`.
pub async fn record<S: AttendanceStore>(
    store: &S,
    features: &FeatureSet,
    person: &Person,
    date: NaiveDate,
    session: Session,
    time_in: NaiveTime,
    is_late: bool,
) -> EngineResult<(AttendanceRecord, bool)> {
    let column = if features.has_session_time_columns {
        match session {
            Session::Morning => TimeColumn::Morning,
            Session::Afternoon => TimeColumn::Afternoon,
        }
    } else {
        TimeColumn::Generic
    };

    // The generic schema always carries its is_late column; per-session
    // late flags are an optional migration.
    let late_flag = match column {
        TimeColumn::Generic => Some(is_late),
        _ => features.has_late_flag_columns.then_some(is_late),
    };

    let status = match column {
        TimeColumn::Generic => "time_in".to_string(),
        _ if is_late => "late".to_string(),
        _ => "present".to_string(),
    };

    let plan = WritePlan {
        person_type: person.person_type,
        person_id: person.row_id,
        date,
        column,
        time_in,
        late_flag,
        status: status.clone(),
        lock_row: person.person_type == PersonType::Teacher,
    };

    let outcome = store.upsert_time_in(&plan).await?;

    let record = AttendanceRecord {
        person_type: person.person_type,
        person_id: person.row_id,
        date,
        session,
        time_in: outcome.time_in,
        is_late,
        status,
    };
    Ok((record, outcome.was_new))
}
