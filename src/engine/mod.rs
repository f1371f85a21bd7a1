pub mod classifier;
pub mod features;
pub mod identifier;
pub mod ledger;
pub mod resolver;

use crate::error::{EngineError, EngineResult};
use crate::model::attendance::Session;
use crate::model::person::{Person, PersonType};
use crate::store::AttendanceStore;
use chrono::{NaiveDate, NaiveTime};
use features::FeatureSet;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

/// What the caller gets back for a successfully classified scan.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClassificationResult {
    pub person_type: PersonType,
    #[schema(example = "4354188")]
    pub canonical_id: String,
    #[schema(example = "Juan Dela Cruz")]
    pub display_name: String,
    pub session: Session,
    pub is_late: bool,
    #[schema(example = "07:45:00", value_type = String, format = "time")]
    pub time_recorded: NaiveTime,
    pub was_already_recorded: bool,
}

/// Attendance Classification & Recording Engine.
///
/// Single entry point for manual-entry and QR-scan callers. Holds the
/// storage adapter and the feature set probed once at startup; individual
/// requests share it read-only.
pub struct AttendanceEngine<S> {
    store: S,
    features: FeatureSet,
}

impl<S: AttendanceStore> AttendanceEngine<S> {
    /// Probe storage capabilities once and build the engine around them.
    pub async fn bootstrap(store: S) -> EngineResult<Self> {
        let features = store.probe_features().await?;
        info!(?features, "storage capabilities probed");
        Ok(Self { store, features })
    }

    /// Build with a known feature set, skipping the probe.
    pub fn with_features(store: S, features: FeatureSet) -> Self {
        Self { store, features }
    }

    /// Classify and record one scan: normalize the identifier, look up the
    /// person, resolve their schedule, classify the timestamp, persist.
    pub async fn record_attendance(
        &self,
        raw_identifier: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> EngineResult<ClassificationResult> {
        let normalized = identifier::normalize(raw_identifier)?;
        let person = self.lookup(&normalized).await?;

        let shift_override = if self.features.has_shift_override {
            self.store.shift_override(&person, &self.features).await?
        } else {
            None
        };

        let schedule = resolver::resolve(&self.store, &self.features, &person).await?;
        let (session, is_late) = classifier::classify(&schedule, shift_override, time);
        let (record, was_new) =
            ledger::record(&self.store, &self.features, &person, date, session, time, is_late)
                .await?;

        info!(
            person = %person.canonical_id,
            %session,
            is_late,
            was_new,
            "attendance scan processed"
        );

        Ok(ClassificationResult {
            person_type: person.person_type,
            canonical_id: person.canonical_id,
            display_name: person.display_name,
            session,
            is_late,
            time_recorded: record.time_in,
            was_already_recorded: !was_new,
        })
    }

    async fn lookup(&self, normalized: &identifier::NormalizedId) -> EngineResult<Person> {
        let row = match normalized.person_type {
            PersonType::Student => self.store.find_student(&normalized.canonical).await?,
            PersonType::Teacher => self.store.find_teacher(&normalized.lookup_keys).await?,
        };
        let row = row.ok_or_else(|| EngineError::PersonNotFound {
            person_type: normalized.person_type,
            identifier: normalized.canonical.clone(),
        })?;

        // Over-long staff codes are repaired from the row id now that the
        // lookup has one.
        let canonical = if normalized.needs_repair {
            identifier::repair_staff_code(&normalized.canonical, Some(row.id))
        } else {
            normalized.canonical.clone()
        };

        Ok(Person::from_row(normalized.person_type, canonical, &row))
    }
}
