//! The delivered-lecture log and the per-volunteer lecture counter.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use tutordesk_core::{normalize_email, Lecture};
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LectureRow {
    pub id: Uuid,
    pub volunteer_id: Uuid,
    pub name: String,
    pub subject: String,
    pub student_email: String,
    pub link: String,
    pub lecture_date: Option<DateTime<Utc>>,
    pub duration: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<LectureRow> for Lecture {
    fn from(row: LectureRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            subject: row.subject,
            student_email: row.student_email,
            link: row.link,
            lecture_date: row.lecture_date,
            duration: row.duration,
            created_at: row.created_at,
        }
    }
}

/// Fields for a new lecture. Validation happens before this point.
#[derive(Debug, Clone)]
pub struct NewLecture<'a> {
    pub volunteer_id: Uuid,
    pub name: &'a str,
    pub subject: &'a str,
    pub student_email: &'a str,
    pub link: &'a str,
    pub lecture_date: Option<DateTime<Utc>>,
    pub duration: Decimal,
}

const LECTURE_COLUMNS: &str = "id, volunteer_id, name, subject, student_email, link, \
     lecture_date, duration, created_at";

/// A volunteer's full lecture log, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_lectures(
    executor: impl PgExecutor<'_>,
    volunteer_id: Uuid,
) -> Result<Vec<LectureRow>, DbError> {
    let rows = sqlx::query_as::<_, LectureRow>(&format!(
        "SELECT {LECTURE_COLUMNS} FROM lectures \
         WHERE volunteer_id = $1 \
         ORDER BY created_at, id"
    ))
    .bind(volunteer_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Insert a lecture; the student email is stored lower-cased.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_lecture(
    executor: impl PgExecutor<'_>,
    lecture: &NewLecture<'_>,
) -> Result<LectureRow, DbError> {
    let row = sqlx::query_as::<_, LectureRow>(&format!(
        "INSERT INTO lectures \
             (id, volunteer_id, name, subject, student_email, link, lecture_date, duration) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {LECTURE_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(lecture.volunteer_id)
    .bind(lecture.name)
    .bind(lecture.subject)
    .bind(normalize_email(lecture.student_email))
    .bind(lecture.link)
    .bind(lecture.lecture_date)
    .bind(lecture.duration)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Delete a lecture and return what was removed.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no lecture has `id`, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_lecture_row(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<LectureRow, DbError> {
    sqlx::query_as::<_, LectureRow>(&format!(
        "DELETE FROM lectures WHERE id = $1 RETURNING {LECTURE_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(DbError::NotFound)
}

/// Move `lecture_count` by `delta`, floored at zero.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no volunteer has `volunteer_id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn adjust_lecture_count(
    executor: impl PgExecutor<'_>,
    volunteer_id: Uuid,
    delta: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE volunteers \
         SET lecture_count = GREATEST(lecture_count + $1, 0), updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(delta)
    .bind(volunteer_id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
