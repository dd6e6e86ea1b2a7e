//! The weekly aggregation pass.
//!
//! [`run_scan`] walks every volunteer in a stable order, evaluates their
//! students against the window, and upserts the week's report. In
//! [`RunMode::Scheduled`] it also maintains streak counters and opens one
//! shortfall notification per (volunteer, student, subject). The caller owns
//! the transaction: everything here runs on the connection it is given.

use sqlx::PgConnection;
use tutordesk_core::{
    evaluate_volunteer, flag_member, plan_streak_update, ComplianceWindow, FlaggedMember,
    Lecture, MembershipStatus, StreakUpdate, UnderTargetStudent, VolunteerSnapshot, WeeklyReport,
};
use tutordesk_db::{DbError, ScanVolunteerRow};

use crate::error::ComplianceError;
use crate::types::{RunMode, ScanOutcome};

#[derive(Debug, Default)]
struct Tally {
    streaks_incremented: usize,
    streaks_reset: usize,
    notifications_created: usize,
}

/// Scan every volunteer for `window` and persist the week's report.
///
/// # Errors
///
/// Returns [`ComplianceError::Db`] on any storage failure; the caller's
/// transaction should then be rolled back.
pub async fn run_scan(
    conn: &mut PgConnection,
    window: &ComplianceWindow,
    mode: RunMode,
) -> Result<ScanOutcome, ComplianceError> {
    let volunteers = tutordesk_db::list_scan_volunteers(&mut *conn).await?;
    let total_users_processed = i32::try_from(volunteers.len()).unwrap_or(i32::MAX);

    let mut members: Vec<FlaggedMember> = Vec::new();
    let mut tally = Tally::default();

    for row in volunteers {
        if let Some(member) = scan_volunteer(conn, row, window, mode, &mut tally).await? {
            members.push(member);
        }
    }

    let report: WeeklyReport = tutordesk_db::upsert_weekly_report(
        &mut *conn,
        window.start(),
        window.end(),
        &members,
        total_users_processed,
    )
    .await?
    .into();

    tracing::info!(
        mode = %mode,
        week_start = %window.start(),
        scanned = total_users_processed,
        flagged = report.members.len(),
        streaks_incremented = tally.streaks_incremented,
        streaks_reset = tally.streaks_reset,
        notifications_created = tally.notifications_created,
        "compliance: scan complete"
    );

    Ok(ScanOutcome {
        mode,
        window: *window,
        report,
        streaks_incremented: tally.streaks_incremented,
        streaks_reset: tally.streaks_reset,
        notifications_created: tally.notifications_created,
    })
}

async fn scan_volunteer(
    conn: &mut PgConnection,
    row: ScanVolunteerRow,
    window: &ComplianceWindow,
    mode: RunMode,
    tally: &mut Tally,
) -> Result<Option<FlaggedMember>, ComplianceError> {
    let membership_status = row
        .membership_status
        .as_deref()
        .map(str::parse::<MembershipStatus>)
        .transpose()
        .map_err(|e| DbError::InvalidStoredValue(e.to_string()))?;

    let mut snapshot = VolunteerSnapshot {
        id: row.id,
        name: row
            .membership_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(row.name),
        email: row.email,
        membership_status,
        low_lecture_streak: row.low_lecture_streak,
        last_flagged_week: row.last_flagged_week,
        students: Vec::new(),
        lectures: Vec::new(),
    };

    if !snapshot.is_approved() {
        tracing::debug!(volunteer = %snapshot.id, "compliance: skipping volunteer without approved membership");
        apply_streak(conn, &snapshot, window, mode, false, tally).await?;
        return Ok(None);
    }

    snapshot.students = tutordesk_db::load_students(conn, snapshot.id).await?;
    if snapshot.students.is_empty() {
        apply_streak(conn, &snapshot, window, mode, false, tally).await?;
        return Ok(None);
    }

    snapshot.lectures = tutordesk_db::list_lectures(&mut *conn, snapshot.id)
        .await?
        .into_iter()
        .map(Lecture::from)
        .collect();

    let under_target = evaluate_volunteer(&snapshot, window);
    let flagged = !under_target.is_empty();

    let streak = apply_streak(conn, &snapshot, window, mode, flagged, tally).await?;

    if !flagged {
        return Ok(None);
    }

    if mode.writes_side_effects() {
        open_shortfall_notifications(conn, &snapshot, &under_target, tally).await?;
    }

    Ok(Some(flag_member(&snapshot, under_target, streak)))
}

/// Apply the streak plan in scheduled mode; returns the streak to snapshot.
async fn apply_streak(
    conn: &mut PgConnection,
    snapshot: &VolunteerSnapshot,
    window: &ComplianceWindow,
    mode: RunMode,
    flagged: bool,
    tally: &mut Tally,
) -> Result<i32, ComplianceError> {
    if !mode.writes_side_effects() {
        return Ok(snapshot.low_lecture_streak);
    }

    let update = plan_streak_update(
        snapshot.low_lecture_streak,
        snapshot.last_flagged_week,
        window,
        flagged,
    );

    match update {
        StreakUpdate::Increment { streak, week_start } => {
            tutordesk_db::set_low_lecture_streak(&mut *conn, snapshot.id, streak, Some(week_start))
                .await?;
            tally.streaks_incremented += 1;
        }
        StreakUpdate::Reset => {
            tutordesk_db::set_low_lecture_streak(&mut *conn, snapshot.id, 0, None).await?;
            tally.streaks_reset += 1;
        }
        StreakUpdate::Unchanged => {}
    }

    Ok(update.resulting_streak(snapshot.low_lecture_streak))
}

async fn open_shortfall_notifications(
    conn: &mut PgConnection,
    snapshot: &VolunteerSnapshot,
    under_target: &[UnderTargetStudent],
    tally: &mut Tally,
) -> Result<(), ComplianceError> {
    for student in under_target {
        for subject in &student.under_target_subjects {
            let message = format!(
                "Weekly lectures for student {} in subject {} are below the minimum ({}/{})",
                student.student_name,
                subject.name,
                subject.delivered_lectures,
                subject.min_lectures
            );
            let created = tutordesk_db::insert_shortfall_notification(
                &mut *conn,
                snapshot.id,
                &student.student_email,
                &subject.name,
                subject.min_lectures,
                subject.delivered_lectures,
                &message,
            )
            .await?;
            if created {
                tally.notifications_created += 1;
            }
        }
    }
    Ok(())
}
