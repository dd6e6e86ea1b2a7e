//! Volunteer directory reads and the engine-owned streak fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::DbError;

/// A volunteer joined with its membership, as listed by the API.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VolunteerRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub lecture_count: i32,
    pub low_lecture_streak: i32,
    pub last_flagged_week: Option<DateTime<Utc>>,
    pub membership_status: Option<String>,
    pub volunteer_hours: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the compliance scan needs per volunteer before loading the roster.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanVolunteerRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub membership_name: Option<String>,
    pub membership_status: Option<String>,
    pub low_lecture_streak: i32,
    pub last_flagged_week: Option<DateTime<Utc>>,
}

const VOLUNTEER_COLUMNS: &str = "v.id, v.email, v.name, v.role, v.lecture_count, \
     v.low_lecture_streak, v.last_flagged_week, \
     m.status AS membership_status, m.volunteer_hours, v.created_at, v.updated_at";

/// All volunteers (role `volunteer`) in directory order, i.e. insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scan_volunteers(
    executor: impl PgExecutor<'_>,
) -> Result<Vec<ScanVolunteerRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanVolunteerRow>(
        "SELECT v.id, v.email, v.name, m.name AS membership_name, \
                m.status AS membership_status, v.low_lecture_streak, v.last_flagged_week \
         FROM volunteers v \
         LEFT JOIN memberships m ON m.email = v.email \
         WHERE v.role = 'volunteer' \
         ORDER BY v.seq",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Volunteers with their membership status, in directory order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_volunteers(pool: &PgPool) -> Result<Vec<VolunteerRow>, DbError> {
    let rows = sqlx::query_as::<_, VolunteerRow>(&format!(
        "SELECT {VOLUNTEER_COLUMNS} \
         FROM volunteers v \
         LEFT JOIN memberships m ON m.email = v.email \
         WHERE v.role = 'volunteer' \
         ORDER BY v.seq"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no volunteer has `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_volunteer(executor: impl PgExecutor<'_>, id: Uuid) -> Result<VolunteerRow, DbError> {
    sqlx::query_as::<_, VolunteerRow>(&format!(
        "SELECT {VOLUNTEER_COLUMNS} \
         FROM volunteers v \
         LEFT JOIN memberships m ON m.email = v.email \
         WHERE v.id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(DbError::NotFound)
}

/// Write both streak fields at once.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no volunteer has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_low_lecture_streak(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    streak: i32,
    last_flagged_week: Option<DateTime<Utc>>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE volunteers \
         SET low_lecture_streak = $1, last_flagged_week = $2, updated_at = NOW() \
         WHERE id = $3",
    )
    .bind(streak)
    .bind(last_flagged_week)
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
