//! Weekly lecture-compliance rules: the reporting window, per-volunteer
//! quota evaluation, streak bookkeeping, and the report snapshot types.
//!
//! Everything here is pure. Persistence and run modes live in
//! `tutordesk-compliance`.

mod evaluate;
mod report;
mod streak;
mod window;

pub use evaluate::{evaluate_volunteer, flag_member};
pub use report::{
    FlaggedMember, LectureSnapshot, UnderTargetStudent, UnderTargetSubject, WeeklyReport,
    UNSPECIFIED_ACADEMIC_LEVEL,
};
pub use streak::{plan_streak_update, StreakUpdate};
pub use window::ComplianceWindow;
