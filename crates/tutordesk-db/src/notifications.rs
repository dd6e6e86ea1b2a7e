//! Volunteer-facing notices: lecture confirmations and per-subject shortfalls.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    LectureAdded,
    LowLectureCountPerSubject,
}

impl NotificationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::LectureAdded => "lecture_added",
            NotificationKind::LowLectureCountPerSubject => "low_lecture_count_per_subject",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub volunteer_id: Uuid,
    pub kind: String,
    pub message: String,
    pub student_email: Option<String>,
    pub subject: Option<String>,
    pub min_lectures: Option<i32>,
    pub current_lectures: Option<i32>,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification<'a> {
    pub volunteer_id: Uuid,
    pub kind: NotificationKind,
    pub message: &'a str,
    pub student_email: Option<&'a str>,
    pub subject: Option<&'a str>,
    pub min_lectures: Option<i32>,
    pub current_lectures: Option<i32>,
    pub link: Option<&'a str>,
}

const NOTIFICATION_COLUMNS: &str = "id, volunteer_id, kind, message, student_email, subject, \
     min_lectures, current_lectures, link, is_read, created_at";

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_notification(
    executor: impl PgExecutor<'_>,
    notification: &NewNotification<'_>,
) -> Result<NotificationRow, DbError> {
    let row = sqlx::query_as::<_, NotificationRow>(&format!(
        "INSERT INTO notifications \
             (id, volunteer_id, kind, message, student_email, subject, \
              min_lectures, current_lectures, link) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(notification.volunteer_id)
    .bind(notification.kind.as_str())
    .bind(notification.message)
    .bind(notification.student_email)
    .bind(notification.subject)
    .bind(notification.min_lectures)
    .bind(notification.current_lectures)
    .bind(notification.link)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Record a shortfall notice unless one is already open for the pair.
///
/// Returns `true` when a new row was written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_shortfall_notification(
    executor: impl PgExecutor<'_>,
    volunteer_id: Uuid,
    student_email: &str,
    subject: &str,
    min_lectures: i32,
    current_lectures: i32,
    message: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO notifications \
             (id, volunteer_id, kind, message, student_email, subject, \
              min_lectures, current_lectures) \
         VALUES ($1, $2, 'low_lecture_count_per_subject', $3, $4, $5, $6, $7) \
         ON CONFLICT (volunteer_id, student_email, subject) \
             WHERE kind = 'low_lecture_count_per_subject' \
         DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(volunteer_id)
    .bind(message)
    .bind(student_email)
    .bind(subject)
    .bind(min_lectures)
    .bind(current_lectures)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Clear the open shortfall notice for a (student, subject) pair.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_shortfall_notifications(
    executor: impl PgExecutor<'_>,
    volunteer_id: Uuid,
    student_email: &str,
    subject: &str,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM notifications \
         WHERE volunteer_id = $1 \
           AND kind = 'low_lecture_count_per_subject' \
           AND student_email = $2 \
           AND subject = $3",
    )
    .bind(volunteer_id)
    .bind(student_email)
    .bind(subject)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_notifications(
    executor: impl PgExecutor<'_>,
    volunteer_id: Uuid,
) -> Result<Vec<NotificationRow>, DbError> {
    let rows = sqlx::query_as::<_, NotificationRow>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
         WHERE volunteer_id = $1 \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(volunteer_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Returns the number of notifications that changed state.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_all_notifications_read(
    executor: impl PgExecutor<'_>,
    volunteer_id: Uuid,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = true \
         WHERE volunteer_id = $1 AND is_read = false",
    )
    .bind(volunteer_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Delete one notification owned by `volunteer_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the notification does not exist or belongs
/// to another volunteer, or [`DbError::Sqlx`] if the delete fails.
pub async fn delete_notification(
    executor: impl PgExecutor<'_>,
    volunteer_id: Uuid,
    notification_id: Uuid,
) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND volunteer_id = $2")
        .bind(notification_id)
        .bind(volunteer_id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
