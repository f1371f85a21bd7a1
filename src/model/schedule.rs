use chrono::NaiveTime;
use once_cell::sync::Lazy;
use strum_macros::{Display, EnumString};

/// Specificity level a schedule is bound to. Lookup precedence is
/// Section > GradeLevel > Default.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ScheduleScope {
    Section,
    GradeLevel,
    Default,
}

/// Schedule row as stored. Time columns are legacy free-text values
/// (24-hour or 12-hour with meridiem) and are parsed leniently by the
/// resolver, one field at a time.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct ScheduleRow {
    pub id: u64,
    pub scope_type: String,
    pub scope_value: Option<String>,
    pub morning_start: Option<String>,
    pub morning_end: Option<String>,
    pub morning_late_after: Option<String>,
    pub afternoon_start: Option<String>,
    pub afternoon_end: Option<String>,
    pub afternoon_late_after: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
}

/// Fully parsed schedule the classifier works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub morning_start: NaiveTime,
    pub morning_end: NaiveTime,
    pub morning_late_after: NaiveTime,
    pub afternoon_start: NaiveTime,
    pub afternoon_end: NaiveTime,
    pub afternoon_late_after: NaiveTime,
}

// Hard-coded constants used when no schedule table exists, no schedule
// matches, or an individual time field cannot be parsed.
static FALLBACK: Lazy<Schedule> = Lazy::new(|| Schedule {
    morning_start: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
    morning_end: NaiveTime::from_hms_opt(11, 59, 59).unwrap(),
    morning_late_after: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
    afternoon_start: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
    afternoon_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
    afternoon_late_after: NaiveTime::from_hms_opt(13, 30, 0).unwrap(),
});

impl Schedule {
    /// Synthetic default schedule (morning 06:00-11:59 late after 07:30,
    /// afternoon 12:00-18:00 late after 13:30).
    pub fn fallback() -> Self {
        *FALLBACK
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::fallback()
    }
}
