/// Which optional tables/columns exist in the current deployment.
///
/// Probed from storage once at startup and injected into the engine as a
/// plain value; never re-queried per classification call. Components degrade
/// gracefully (skip a field, use a fallback constant) when a capability is
/// absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSet {
    /// `schedules` table exists at all
    pub has_schedule_table: bool,
    /// `attendance` has `morning_time_in` / `afternoon_time_in`
    pub has_session_time_columns: bool,
    /// `attendance` has `morning_is_late` / `afternoon_is_late`
    pub has_late_flag_columns: bool,
    /// `sections` / `departments` carry a `shift` override column
    pub has_shift_override: bool,
}

impl FeatureSet {
    /// Everything present. Matches a current-generation deployment.
    pub fn full() -> Self {
        Self {
            has_schedule_table: true,
            has_session_time_columns: true,
            has_late_flag_columns: true,
            has_shift_override: true,
        }
    }

    /// Oldest supported schema: single generic `time_in` column, no
    /// schedule table, no overrides.
    pub fn legacy() -> Self {
        Self {
            has_schedule_table: false,
            has_session_time_columns: false,
            has_late_flag_columns: false,
            has_shift_override: false,
        }
    }
}
