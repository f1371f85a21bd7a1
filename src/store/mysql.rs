use crate::engine::features::FeatureSet;
use crate::error::EngineResult;
use crate::model::attendance::Session;
use crate::model::person::{Person, PersonRow, PersonType};
use crate::model::schedule::{ScheduleRow, ScheduleScope};
use crate::store::{AttendanceStore, UpsertOutcome, WritePlan};
use chrono::NaiveTime;
use sqlx::mysql::MySqlConnection;
use sqlx::{MySqlPool, Transaction};
use std::collections::HashSet;
use tracing::{info, warn};

/// MySQL-backed storage adapter.
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn table_exists(&self, table: &str) -> EngineResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_name = ?
            "#,
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn column_names(&self, table: &str) -> EngineResult<HashSet<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT column_name FROM information_schema.columns
            WHERE table_schema = DATABASE() AND table_name = ?
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        Ok(names.into_iter().map(|n| n.to_lowercase()).collect())
    }

    /// Read the planned slot for the (person, date) row, optionally taking
    /// a row lock. Returns (row id, stored value) when the row exists.
    async fn fetch_slot(
        &self,
        conn: &mut MySqlConnection,
        plan: &WritePlan,
        lock: bool,
    ) -> EngineResult<Option<(u64, Option<NaiveTime>)>> {
        let sql = format!(
            "SELECT id, {} FROM attendance WHERE person_type = ? AND person_id = ? AND date = ?{}",
            plan.column.time_field(),
            if lock { " FOR UPDATE" } else { "" },
        );
        let row = sqlx::query_as::<_, (u64, Option<NaiveTime>)>(&sql)
            .bind(plan.person_type.to_string())
            .bind(plan.person_id)
            .bind(plan.date)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    async fn insert_row(
        &self,
        conn: &mut MySqlConnection,
        plan: &WritePlan,
    ) -> Result<(), sqlx::Error> {
        let mut columns = vec!["person_type", "person_id", "date", plan.column.time_field()];
        if plan.late_flag.is_some() {
            columns.push(plan.column.late_field());
        }
        columns.push("status");

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO attendance ({}) VALUES ({})",
            columns.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql)
            .bind(plan.person_type.to_string())
            .bind(plan.person_id)
            .bind(plan.date)
            .bind(plan.time_in);
        if let Some(late) = plan.late_flag {
            query = query.bind(late);
        }
        query = query.bind(&plan.status);

        query.execute(&mut *conn).await?;
        Ok(())
    }

    /// Fill the slot only while it is still empty. Returns whether this
    /// write won the slot; 0 affected rows means a concurrent scan filled
    /// it first.
    async fn fill_slot(
        &self,
        conn: &mut MySqlConnection,
        row_id: u64,
        plan: &WritePlan,
    ) -> EngineResult<bool> {
        let sql = fill_slot_sql(plan);

        let mut query = sqlx::query(&sql).bind(plan.time_in);
        if let Some(late) = plan.late_flag {
            query = query.bind(late);
        }
        query = query.bind(&plan.status).bind(row_id);

        let result = query.execute(&mut *conn).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply the plan against an existing row, or report that none exists.
    async fn settle_existing(
        &self,
        tx: &mut Transaction<'_, sqlx::MySql>,
        plan: &WritePlan,
        lock: bool,
    ) -> EngineResult<Option<UpsertOutcome>> {
        match self.fetch_slot(&mut **tx, plan, lock).await? {
            Some((_, Some(stored))) => Ok(Some(UpsertOutcome {
                time_in: stored,
                was_new: false,
            })),
            Some((row_id, None)) => {
                if self.fill_slot(&mut **tx, row_id, plan).await? {
                    return Ok(Some(UpsertOutcome {
                        time_in: plan.time_in,
                        was_new: true,
                    }));
                }
                // The conditional update matched nothing: a concurrent scan
                // filled the slot after our read. A locking re-read sees the
                // winner's committed value.
                match self.fetch_slot(&mut **tx, plan, true).await? {
                    Some((_, Some(stored))) => Ok(Some(UpsertOutcome {
                        time_in: stored,
                        was_new: false,
                    })),
                    _ => Err(sqlx::Error::RowNotFound.into()),
                }
            }
            None => Ok(None),
        }
    }
}

/// Conditional fill: the `IS NULL` guard makes the update-if-empty branch
/// atomic without a lock, so two concurrent scans cannot both claim the
/// same slot.
fn fill_slot_sql(plan: &WritePlan) -> String {
    let mut assignments = vec![format!("{} = ?", plan.column.time_field())];
    if plan.late_flag.is_some() {
        assignments.push(format!("{} = ?", plan.column.late_field()));
    }
    assignments.push("status = ?".to_string());

    format!(
        "UPDATE attendance SET {} WHERE id = ? AND {} IS NULL",
        assignments.join(", "),
        plan.column.time_field()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TimeColumn;
    use chrono::NaiveDate;

    fn plan(column: TimeColumn, late_flag: Option<bool>) -> WritePlan {
        WritePlan {
            person_type: PersonType::Student,
            person_id: 7,
            date: NaiveDate::from_ymd_opt(2026, 8, 24).unwrap(),
            column,
            time_in: NaiveTime::from_hms_opt(7, 45, 0).unwrap(),
            late_flag,
            status: "present".into(),
            lock_row: false,
        }
    }

    #[test]
    fn fill_update_is_conditional_on_empty_slot() {
        // without the IS NULL guard two concurrent scans could both claim
        // the slot and the later one would overwrite the stored time
        let sql = fill_slot_sql(&plan(TimeColumn::Afternoon, Some(false)));
        assert_eq!(
            sql,
            "UPDATE attendance SET afternoon_time_in = ?, afternoon_is_late = ?, status = ? \
             WHERE id = ? AND afternoon_time_in IS NULL"
        );
    }

    #[test]
    fn fill_skips_absent_late_column() {
        let sql = fill_slot_sql(&plan(TimeColumn::Generic, None));
        assert_eq!(
            sql,
            "UPDATE attendance SET time_in = ?, status = ? WHERE id = ? AND time_in IS NULL"
        );
    }
}

fn is_duplicate_key(err: &sqlx::Error) -> bool {
    // MySQL signals unique-key violations with SQLSTATE 23000
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

impl AttendanceStore for MySqlStore {
    async fn probe_features(&self) -> EngineResult<FeatureSet> {
        let attendance = self.column_names("attendance").await?;
        let sections = self.column_names("sections").await?;
        let departments = self.column_names("departments").await?;

        let features = FeatureSet {
            has_schedule_table: self.table_exists("schedules").await?,
            has_session_time_columns: attendance.contains("morning_time_in")
                && attendance.contains("afternoon_time_in"),
            has_late_flag_columns: attendance.contains("morning_is_late")
                && attendance.contains("afternoon_is_late"),
            has_shift_override: sections.contains("shift") && departments.contains("shift"),
        };
        info!(?features, "storage schema introspected");
        Ok(features)
    }

    async fn find_student(&self, lrn: &str) -> EngineResult<Option<PersonRow>> {
        let row = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT id, lrn AS code, first_name, last_name,
                   section AS scope_key, grade_level
            FROM students
            WHERE lrn = ?
            "#,
        )
        .bind(lrn)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_teacher(&self, keys: &[String]) -> EngineResult<Option<PersonRow>> {
        // Keys are tried one at a time so the canonical form always beats
        // the legacy alternates when both match a row.
        for key in keys {
            let row = sqlx::query_as::<_, PersonRow>(
                r#"
                SELECT id, faculty_id AS code, first_name, last_name,
                       department AS scope_key, NULL AS grade_level
                FROM teachers
                WHERE faculty_id = ?
                LIMIT 1
                "#,
            )
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
            if row.is_some() {
                return Ok(row);
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
        let table = match person.person_type {
            PersonType::Student => "sections",
            PersonType::Teacher => "departments",
        };
        let sql = format!("SELECT shift FROM {table} WHERE name = ?");
        let shift: Option<Option<String>> = sqlx::query_scalar(&sql)
            .bind(&person.scope_key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(shift
            .flatten()
            .and_then(|value| value.trim().parse::<Session>().ok()))
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
        let base = r#"
            SELECT id, scope_type, scope_value,
                   morning_start, morning_end, morning_late_after,
                   afternoon_start, afternoon_end, afternoon_late_after,
                   is_active, is_default
            FROM schedules
            WHERE is_active = 1
        "#;
        let rows = match scope {
            ScheduleScope::Default => {
                let sql = format!("{base} AND is_default = 1 ORDER BY id");
                sqlx::query_as::<_, ScheduleRow>(&sql).fetch_all(&self.pool).await?
            }
            _ => {
                let sql = format!("{base} AND scope_type = ? AND scope_value = ? ORDER BY id");
                sqlx::query_as::<_, ScheduleRow>(&sql)
                    .bind(scope.to_string())
                    .bind(value.unwrap_or_default())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn upsert_time_in(&self, plan: &WritePlan) -> EngineResult<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;

        let outcome = match self.settle_existing(&mut tx, plan, plan.lock_row).await? {
            Some(outcome) => outcome,
            None => match self.insert_row(&mut *tx, plan).await {
                Ok(()) => UpsertOutcome {
                    time_in: plan.time_in,
                    was_new: true,
                },
                Err(err) if is_duplicate_key(&err) => {
                    // Lost the insert race to a concurrent scan. The winning
                    // row is committed; settle against it under a lock.
                    warn!(
                        person_id = plan.person_id,
                        "concurrent attendance insert detected, re-reading"
                    );
                    match self.settle_existing(&mut tx, plan, true).await? {
                        Some(outcome) => outcome,
                        None => return Err(err.into()),
                    }
                }
                Err(err) => return Err(err.into()),
            },
        };

        tx.commit().await?;
        Ok(outcome)
    }
}
