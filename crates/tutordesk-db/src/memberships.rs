use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use tutordesk_core::{normalize_email, MembershipStatus};

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MembershipRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub status: String,
    pub volunteer_hours: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_membership_by_email(
    executor: impl PgExecutor<'_>,
    email: &str,
) -> Result<Option<MembershipRow>, DbError> {
    let row = sqlx::query_as::<_, MembershipRow>(
        "SELECT id, email, name, status, volunteer_hours, created_at, updated_at \
         FROM memberships \
         WHERE email = $1",
    )
    .bind(normalize_email(email))
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Insert or update a membership keyed on email.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_membership(
    executor: impl PgExecutor<'_>,
    email: &str,
    name: &str,
    status: MembershipStatus,
    volunteer_hours: Decimal,
) -> Result<MembershipRow, DbError> {
    let row = sqlx::query_as::<_, MembershipRow>(
        "INSERT INTO memberships (email, name, status, volunteer_hours) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (email) DO UPDATE SET \
             name = EXCLUDED.name, \
             status = EXCLUDED.status, \
             volunteer_hours = EXCLUDED.volunteer_hours, \
             updated_at = NOW() \
         RETURNING id, email, name, status, volunteer_hours, created_at, updated_at",
    )
    .bind(normalize_email(email))
    .bind(name)
    .bind(status.as_str())
    .bind(volunteer_hours)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Add `delta` hours (negative to subtract), never going below zero.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no membership exists for `email`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn adjust_volunteer_hours(
    executor: impl PgExecutor<'_>,
    email: &str,
    delta: Decimal,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE memberships \
         SET volunteer_hours = GREATEST(volunteer_hours + $1, 0), updated_at = NOW() \
         WHERE email = $2",
    )
    .bind(delta)
    .bind(normalize_email(email))
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
