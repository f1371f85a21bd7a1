//! In-memory store used by engine tests.

use crate::engine::features::FeatureSet;
use crate::error::EngineResult;
use crate::model::attendance::Session;
use crate::model::person::{Person, PersonRow, PersonType};
use crate::model::schedule::{ScheduleRow, ScheduleScope};
use crate::store::{AttendanceStore, UpsertOutcome, WritePlan};
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct StoredRow {
    times: HashMap<&'static str, NaiveTime>,
    lates: HashMap<&'static str, bool>,
    status: String,
}

pub struct MemoryStore {
    features: FeatureSet,
    students: Vec<PersonRow>,
    teachers: Vec<PersonRow>,
    shifts: HashMap<(PersonType, String), Session>,
    schedules: Vec<ScheduleRow>,
    rows: Mutex<HashMap<(PersonType, u64, NaiveDate), StoredRow>>,
}

impl MemoryStore {
    pub fn new(features: FeatureSet) -> Self {
        Self {
            features,
            students: Vec::new(),
            teachers: Vec::new(),
            shifts: HashMap::new(),
            schedules: Vec::new(),
            rows: Mutex::new(HashMap::new()),
        }
    }

    pub fn features(&self) -> FeatureSet {
        self.features
    }

    pub fn with_student(
        mut self,
        id: u64,
        lrn: &str,
        first_name: &str,
        last_name: &str,
        section: &str,
        grade_level: Option<&str>,
    ) -> Self {
        self.students.push(PersonRow {
            id,
            code: lrn.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            scope_key: section.into(),
            grade_level: grade_level.map(Into::into),
        });
        self
    }

    pub fn with_teacher(
        mut self,
        id: u64,
        faculty_id: &str,
        first_name: &str,
        last_name: &str,
        department: &str,
    ) -> Self {
        self.teachers.push(PersonRow {
            id,
            code: faculty_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            scope_key: department.into(),
            grade_level: None,
        });
        self
    }

    pub fn with_shift_override(
        mut self,
        person_type: PersonType,
        scope_key: &str,
        session: Session,
    ) -> Self {
        self.shifts.insert((person_type, scope_key.into()), session);
        self
    }

    pub fn with_schedule(mut self, row: ScheduleRow) -> Self {
        self.schedules.push(row);
        self
    }

    pub fn stored_time(
        &self,
        person_type: PersonType,
        person_id: u64,
        date: NaiveDate,
        column: &str,
    ) -> Option<NaiveTime> {
        let rows = self.rows.lock().unwrap();
        rows.get(&(person_type, person_id, date))
            .and_then(|row| row.times.get(column).copied())
    }

    pub fn stored_late(
        &self,
        person_type: PersonType,
        person_id: u64,
        date: NaiveDate,
        column: &str,
    ) -> Option<bool> {
        let rows = self.rows.lock().unwrap();
        rows.get(&(person_type, person_id, date))
            .and_then(|row| row.lates.get(column).copied())
    }
}

impl AttendanceStore for MemoryStore {
    async fn probe_features(&self) -> EngineResult<FeatureSet> {
        Ok(self.features)
    }

    async fn find_student(&self, lrn: &str) -> EngineResult<Option<PersonRow>> {
        Ok(self.students.iter().find(|row| row.code == lrn).cloned())
    }

    async fn find_teacher(&self, keys: &[String]) -> EngineResult<Option<PersonRow>> {
        for key in keys {
            if let Some(row) = self.teachers.iter().find(|row| &row.code == key) {
                return Ok(Some(row.clone()));
            }
        }
        Ok(None)
    }

    async fn shift_override(
        &self,
        person: &Person,
        features: &FeatureSet,
    ) -> EngineResult<Option<Session>> {
        if !features.has_shift_override {
            return Ok(None);
        }
        Ok(self
            .shifts
            .get(&(person.person_type, person.scope_key.clone()))
            .copied())
    }

    async fn active_schedules(
        &self,
        scope: ScheduleScope,
        value: Option<&str>,
        features: &FeatureSet,
    ) -> EngineResult<Vec<ScheduleRow>> {
        if !features.has_schedule_table {
            return Ok(Vec::new());
        }
        let scope_type = scope.to_string();
        Ok(self
            .schedules
            .iter()
            .filter(|row| row.is_active && row.scope_type == scope_type)
            .filter(|row| match scope {
                ScheduleScope::Default => row.is_default,
                _ => row.scope_value.as_deref() == value,
            })
            .cloned()
            .collect())
    }

    async fn upsert_time_in(&self, plan: &WritePlan) -> EngineResult<UpsertOutcome> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .entry((plan.person_type, plan.person_id, plan.date))
            .or_default();

        let field = plan.column.time_field();
        if let Some(stored) = row.times.get(field) {
            return Ok(UpsertOutcome {
                time_in: *stored,
                was_new: false,
            });
        }

        row.times.insert(field, plan.time_in);
        if let Some(late) = plan.late_flag {
            row.lates.insert(plan.column.late_field(), late);
        }
        row.status = plan.status.clone();
        Ok(UpsertOutcome {
            time_in: plan.time_in,
            was_new: true,
        })
    }
}
