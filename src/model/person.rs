use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PersonType {
    Student,
    Teacher,
}

/// Row shape shared by the `students` and `teachers` tables.
///
/// `code` is the stored identifier (LRN or faculty ID), `scope_key` the
/// section name (students) or department (teachers) used for schedule lookup.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PersonRow {
    pub id: u64,
    pub code: String,
    pub first_name: String,
    pub last_name: String,
    pub scope_key: String,
    pub grade_level: Option<String>,
}

/// A resolved person, ready for classification.
#[derive(Debug, Clone)]
pub struct Person {
    pub person_type: PersonType,
    pub canonical_id: String,
    pub row_id: u64,
    pub display_name: String,
    pub scope_key: String,
    pub grade_level: Option<String>,
}

impl Person {
    pub fn from_row(person_type: PersonType, canonical_id: String, row: &PersonRow) -> Self {
        Self {
            person_type,
            canonical_id,
            row_id: row.id,
            display_name: format!("{} {}", row.first_name, row.last_name),
            scope_key: row.scope_key.clone(),
            grade_level: row.grade_level.clone(),
        }
    }
}
