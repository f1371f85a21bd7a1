use crate::model::attendance::Session;
use crate::model::schedule::Schedule;
use chrono::NaiveTime;
use tracing::debug;

/// Map a time of day onto a session and a punctuality outcome.
///
/// A shift override short-circuits window matching. Otherwise the first
/// matching window wins; a timestamp in neither window defaults to the
/// morning session (documented fallback, not a failure). Comparisons are
/// time-of-day only. The lateness boundary is exclusive: arriving exactly
/// at the threshold is on time.
pub fn classify(
    schedule: &Schedule,
    shift_override: Option<Session>,
    time: NaiveTime,
) -> (Session, bool) {
    let session = match shift_override {
        Some(session) => session,
        None => {
            if (schedule.morning_start..=schedule.morning_end).contains(&time) {
                Session::Morning
            } else if (schedule.afternoon_start..=schedule.afternoon_end).contains(&time) {
                Session::Afternoon
            } else {
                debug!(%time, "timestamp outside both windows, defaulting to morning");
                Session::Morning
            }
        }
    };

    let late_after = match session {
        Session::Morning => schedule.morning_late_after,
        Session::Afternoon => schedule.afternoon_late_after,
    };

    (session, time > late_after)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn late_boundary_is_exclusive() {
        let schedule = Schedule::fallback();
        let (_, late) = classify(&schedule, None, t(7, 30, 0));
        assert!(!late);
        let (_, late) = classify(&schedule, None, t(7, 30, 1));
        assert!(late);
    }

    #[test]
    fn windows_pick_the_session() {
        let schedule = Schedule::fallback();
        assert_eq!(classify(&schedule, None, t(6, 15, 0)).0, Session::Morning);
        assert_eq!(classify(&schedule, None, t(13, 0, 0)).0, Session::Afternoon);
    }

    #[test]
    fn afternoon_lateness_uses_afternoon_threshold() {
        let schedule = Schedule::fallback();
        assert_eq!(classify(&schedule, None, t(13, 29, 59)), (Session::Afternoon, false));
        assert_eq!(classify(&schedule, None, t(13, 31, 0)), (Session::Afternoon, true));
    }

    #[test]
    fn out_of_window_defaults_to_morning() {
        let schedule = Schedule::fallback();
        // 19:30 is after both windows; morning threshold applies
        assert_eq!(classify(&schedule, None, t(19, 30, 0)), (Session::Morning, true));
        // 05:00 is before both windows
        assert_eq!(classify(&schedule, None, t(5, 0, 0)), (Session::Morning, false));
    }

    #[test]
    fn shift_override_short_circuits_windows() {
        let schedule = Schedule::fallback();
        // 08:00 sits in the morning window but the person is on the
        // afternoon shift; 08:00 is before the afternoon threshold
        assert_eq!(
            classify(&schedule, Some(Session::Afternoon), t(8, 0, 0)),
            (Session::Afternoon, false)
        );
        assert_eq!(
            classify(&schedule, Some(Session::Afternoon), t(14, 0, 0)),
            (Session::Afternoon, true)
        );
    }
}
