use crate::model::person::PersonType;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// The attendance window a scan falls into.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Session {
    Morning,
    Afternoon,
}

/// One persisted time-in mark. At most one time-in value ever exists per
/// (person, date, session); a repeated mark reports the stored value.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub person_type: PersonType,
    pub person_id: u64,
    pub date: NaiveDate,
    pub session: Session,
    pub time_in: NaiveTime,
    pub is_late: bool,
    pub status: String,
}
