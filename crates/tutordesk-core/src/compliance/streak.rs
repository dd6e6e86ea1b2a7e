use chrono::{DateTime, Utc};

use super::window::ComplianceWindow;

/// What a scheduled scan should write back to a volunteer's streak fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// First time this week: bump the counter and remember the week.
    Increment {
        streak: i32,
        week_start: DateTime<Utc>,
    },
    /// Compliant with a nonzero counter: zero it and clear the week.
    Reset,
    /// Nothing to write.
    Unchanged,
}

/// Decide the streak write for one volunteer after a scheduled scan.
///
/// A flagged volunteer is counted at most once per week: the counter only
/// moves when `last_flagged_week` is absent or strictly before the window.
/// A volunteer that is not flagged (compliant, unapproved, or without
/// students) is reset only if the counter is nonzero.
#[must_use]
pub fn plan_streak_update(
    current_streak: i32,
    last_flagged_week: Option<DateTime<Utc>>,
    window: &ComplianceWindow,
    flagged: bool,
) -> StreakUpdate {
    if flagged {
        match last_flagged_week {
            Some(week) if week >= window.start() => StreakUpdate::Unchanged,
            _ => StreakUpdate::Increment {
                streak: current_streak.max(0).saturating_add(1),
                week_start: window.start(),
            },
        }
    } else if current_streak > 0 {
        StreakUpdate::Reset
    } else {
        StreakUpdate::Unchanged
    }
}

impl StreakUpdate {
    /// The counter value after this update is applied to `current`.
    #[must_use]
    pub fn resulting_streak(self, current: i32) -> i32 {
        match self {
            StreakUpdate::Increment { streak, .. } => streak,
            StreakUpdate::Reset => 0,
            StreakUpdate::Unchanged => current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, NaiveDate};

    fn window() -> ComplianceWindow {
        ComplianceWindow::starting_on(
            NaiveDate::from_ymd_opt(2026, 10, 10).unwrap(),
            FixedOffset::east_opt(3 * 3600).unwrap(),
        )
    }

    #[test]
    fn first_flag_increments_from_zero() {
        let update = plan_streak_update(0, None, &window(), true);
        assert_eq!(
            update,
            StreakUpdate::Increment {
                streak: 1,
                week_start: window().start(),
            }
        );
        assert_eq!(update.resulting_streak(0), 1);
    }

    #[test]
    fn flag_after_an_earlier_week_increments() {
        let earlier = window().start() - Duration::days(7);
        let update = plan_streak_update(2, Some(earlier), &window(), true);
        assert_eq!(update.resulting_streak(2), 3);
    }

    #[test]
    fn second_run_in_the_same_week_is_a_no_op() {
        let update = plan_streak_update(3, Some(window().start()), &window(), true);
        assert_eq!(update, StreakUpdate::Unchanged);
        assert_eq!(update.resulting_streak(3), 3);
    }

    #[test]
    fn compliant_volunteer_with_streak_resets() {
        let update = plan_streak_update(4, Some(window().start()), &window(), false);
        assert_eq!(update, StreakUpdate::Reset);
        assert_eq!(update.resulting_streak(4), 0);
    }

    #[test]
    fn compliant_volunteer_without_streak_is_untouched() {
        assert_eq!(
            plan_streak_update(0, None, &window(), false),
            StreakUpdate::Unchanged
        );
    }
}
