//! One compliance report per week, keyed on `week_start`.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgExecutor;
use tutordesk_core::{FlaggedMember, WeeklyReport};

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WeeklyReportRow {
    pub id: i64,
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
    pub members: Json<Vec<FlaggedMember>>,
    pub total_users_processed: i32,
    pub members_with_low_lectures: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WeeklyReportRow> for WeeklyReport {
    fn from(row: WeeklyReportRow) -> Self {
        Self {
            id: row.id,
            week_start: row.week_start,
            week_end: row.week_end,
            members: row.members.0,
            total_users_processed: row.total_users_processed,
            members_with_low_lectures: row.members_with_low_lectures,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const REPORT_COLUMNS: &str = "id, week_start, week_end, members, total_users_processed, \
     members_with_low_lectures, created_at, updated_at";

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_weekly_report(
    executor: impl PgExecutor<'_>,
    week_start: DateTime<Utc>,
) -> Result<Option<WeeklyReportRow>, DbError> {
    let row = sqlx::query_as::<_, WeeklyReportRow>(&format!(
        "SELECT {REPORT_COLUMNS} FROM weekly_reports WHERE week_start = $1"
    ))
    .bind(week_start)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Same as [`get_weekly_report`] but takes a row lock until the surrounding
/// transaction ends.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn lock_weekly_report(
    executor: impl PgExecutor<'_>,
    week_start: DateTime<Utc>,
) -> Result<Option<WeeklyReportRow>, DbError> {
    let row = sqlx::query_as::<_, WeeklyReportRow>(&format!(
        "SELECT {REPORT_COLUMNS} FROM weekly_reports WHERE week_start = $1 FOR UPDATE"
    ))
    .bind(week_start)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Insert the week's report, or overwrite the members and counts of the
/// existing one. `created_at` survives an overwrite.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_weekly_report(
    executor: impl PgExecutor<'_>,
    week_start: DateTime<Utc>,
    week_end: DateTime<Utc>,
    members: &[FlaggedMember],
    total_users_processed: i32,
) -> Result<WeeklyReportRow, DbError> {
    let flagged = i32::try_from(members.len()).unwrap_or(i32::MAX);

    let row = sqlx::query_as::<_, WeeklyReportRow>(&format!(
        "INSERT INTO weekly_reports \
             (week_start, week_end, members, total_users_processed, members_with_low_lectures) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (week_start) DO UPDATE SET \
             week_end = EXCLUDED.week_end, \
             members = EXCLUDED.members, \
             total_users_processed = EXCLUDED.total_users_processed, \
             members_with_low_lectures = EXCLUDED.members_with_low_lectures, \
             updated_at = NOW() \
         RETURNING {REPORT_COLUMNS}"
    ))
    .bind(week_start)
    .bind(week_end)
    .bind(Json(members))
    .bind(total_users_processed)
    .bind(flagged)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Replace the member snapshot of an existing report after a manual edit.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no report has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_weekly_report_members(
    executor: impl PgExecutor<'_>,
    id: i64,
    members: &[FlaggedMember],
    members_with_low_lectures: i32,
) -> Result<WeeklyReportRow, DbError> {
    sqlx::query_as::<_, WeeklyReportRow>(&format!(
        "UPDATE weekly_reports \
         SET members = $1, members_with_low_lectures = $2, updated_at = NOW() \
         WHERE id = $3 \
         RETURNING {REPORT_COLUMNS}"
    ))
    .bind(Json(members))
    .bind(members_with_low_lectures)
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(DbError::NotFound)
}
