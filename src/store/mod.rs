pub mod mysql;

#[cfg(test)]
pub mod memory;

use crate::engine::features::FeatureSet;
use crate::error::EngineResult;
use crate::model::attendance::Session;
use crate::model::person::{Person, PersonRow, PersonType};
use crate::model::schedule::{ScheduleRow, ScheduleScope};
use chrono::{NaiveDate, NaiveTime};

/// Which concrete column holds the time-in value for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeColumn {
    Morning,
    Afternoon,
    /// Single `time_in` column on schemas without per-session columns.
    Generic,
}

impl TimeColumn {
    pub fn time_field(self) -> &'static str {
        match self {
            TimeColumn::Morning => "morning_time_in",
            TimeColumn::Afternoon => "afternoon_time_in",
            TimeColumn::Generic => "time_in",
        }
    }

    pub fn late_field(self) -> &'static str {
        match self {
            TimeColumn::Morning => "morning_is_late",
            TimeColumn::Afternoon => "afternoon_is_late",
            TimeColumn::Generic => "is_late",
        }
    }
}

/// What the ledger writer asks storage to persist for one scan. The writer
/// has already adapted the plan to the deployment's columns; the store's
/// only job is to apply it atomically.
#[derive(Debug, Clone)]
pub struct WritePlan {
    pub person_type: PersonType,
    pub person_id: u64,
    pub date: NaiveDate,
    pub column: TimeColumn,
    pub time_in: NaiveTime,
    /// None when the deployment has no late-flag column for this slot
    pub late_flag: Option<bool>,
    pub status: String,
    /// Staff scans take a row-level lock before branching insert/update
    pub lock_row: bool,
}

/// Result of applying a [`WritePlan`]. `was_new` is false only when the
/// slot already held a value; `time_in` is then the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub time_in: NaiveTime,
    pub was_new: bool,
}

/// Storage collaborator of the classification engine.
///
/// Implemented by [`mysql::MySqlStore`] in production and by an in-memory
/// store in tests. Methods that vary by deployment take the probed
/// [`FeatureSet`] explicitly rather than re-querying schema state.
#[allow(async_fn_in_trait)]
pub trait AttendanceStore {
    /// Learn which optional columns/tables exist. Called once per process.
    async fn probe_features(&self) -> EngineResult<FeatureSet>;

    async fn find_student(&self, lrn: &str) -> EngineResult<Option<PersonRow>>;

    /// Keys are tried in order (canonical form first, then legacy
    /// alternates); the first key that matches a row wins.
    async fn find_teacher(&self, keys: &[String]) -> EngineResult<Option<PersonRow>>;

    /// Forced session stored on the person's section/department row, if the
    /// deployment carries the column and the row sets it.
    async fn shift_override(
        &self,
        person: &Person,
        features: &FeatureSet,
    ) -> EngineResult<Option<Session>>;

    /// Active schedules bound to the given scope. `value` is None for the
    /// default scope. Empty when the schedule table is absent.
    async fn active_schedules(
        &self,
        scope: ScheduleScope,
        value: Option<&str>,
        features: &FeatureSet,
    ) -> EngineResult<Vec<ScheduleRow>>;

    /// Insert-or-fill the planned time-in slot atomically; a slot that is
    /// already filled is left untouched and reported back.
    async fn upsert_time_in(&self, plan: &WritePlan) -> EngineResult<UpsertOutcome>;
}
