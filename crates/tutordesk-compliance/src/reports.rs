//! Read, regenerate and edit the weekly report.
//!
//! Every entry point derives the week from `now` and the calendar exactly
//! once, so a call that straddles the Saturday boundary stays on one week.

use chrono::{DateTime, FixedOffset, Utc};
use sqlx::PgPool;
use tutordesk_core::{ComplianceWindow, WeeklyReport};
use tutordesk_db::DbError;
use uuid::Uuid;

use crate::engine::run_scan;
use crate::error::ComplianceError;
use crate::types::{RunMode, ScanOutcome};

/// The report for the most recently completed week, generating it lazily
/// when none exists yet.
///
/// # Errors
///
/// Returns [`ComplianceError::Db`] on storage failure.
pub async fn current_report(
    pool: &PgPool,
    now: DateTime<Utc>,
    calendar: FixedOffset,
) -> Result<WeeklyReport, ComplianceError> {
    let window = ComplianceWindow::previous_week(now, calendar);

    if let Some(row) = tutordesk_db::get_weekly_report(pool, window.start()).await? {
        return Ok(row.into());
    }

    tracing::info!(week_start = %window.start(), "compliance: no report for week; generating lazily");
    let mut tx = pool.begin().await?;
    let outcome = run_scan(&mut *tx, &window, RunMode::Lazy).await?;
    tx.commit().await?;
    Ok(outcome.report)
}

/// Run the aggregation for the most recently completed week in `mode`.
///
/// # Errors
///
/// Returns [`ComplianceError::Db`] on storage failure; nothing is written.
pub async fn regenerate(
    pool: &PgPool,
    now: DateTime<Utc>,
    calendar: FixedOffset,
    mode: RunMode,
) -> Result<ScanOutcome, ComplianceError> {
    let window = ComplianceWindow::previous_week(now, calendar);
    let mut tx = pool.begin().await?;
    let outcome = run_scan(&mut *tx, &window, mode).await?;
    tx.commit().await?;
    Ok(outcome)
}

/// Drop one member from the current week's report.
///
/// The live streak counter is left alone. Removing the same member twice
/// yields [`ComplianceError::NotFound`] the second time.
///
/// # Errors
///
/// Returns [`ComplianceError::Validation`] if `member_id` is not a UUID,
/// [`ComplianceError::NotFound`] if the report is empty or lacks the member,
/// or [`ComplianceError::Db`] on storage failure.
pub async fn remove_member(
    pool: &PgPool,
    now: DateTime<Utc>,
    calendar: FixedOffset,
    member_id: &str,
) -> Result<WeeklyReport, ComplianceError> {
    let member_id = Uuid::parse_str(member_id.trim())
        .map_err(|_| ComplianceError::Validation(format!("invalid member id: {member_id}")))?;
    let window = ComplianceWindow::previous_week(now, calendar);

    let mut tx = pool.begin().await?;

    let row = match tutordesk_db::lock_weekly_report(&mut *tx, window.start()).await? {
        Some(row) => row,
        None => {
            run_scan(&mut *tx, &window, RunMode::Lazy).await?;
            tutordesk_db::lock_weekly_report(&mut *tx, window.start())
                .await?
                .ok_or(DbError::NotFound)?
        }
    };

    let mut report: WeeklyReport = row.into();

    if report.members.is_empty() {
        tx.commit().await?;
        return Err(ComplianceError::NotFound(
            "no members with low lectures this week".to_string(),
        ));
    }

    if !report.remove_member(member_id) {
        tx.commit().await?;
        return Err(ComplianceError::NotFound(format!(
            "member {member_id} is not in this week's report"
        )));
    }

    let updated = tutordesk_db::update_weekly_report_members(
        &mut *tx,
        report.id,
        &report.members,
        report.members_with_low_lectures,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        member = %member_id,
        week_start = %window.start(),
        remaining = report.members_with_low_lectures,
        "compliance: member removed from report"
    );

    Ok(updated.into())
}
