//! Volunteer rosters and per-subject quotas.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor};
use tutordesk_core::{normalize_email, Student, SubjectQuota};
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentRow {
    pub id: i64,
    pub volunteer_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub academic_level: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SubjectRow {
    student_id: i64,
    name: String,
    min_lectures: i32,
}

/// Load a volunteer's roster with subject quotas, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn load_students(
    conn: &mut PgConnection,
    volunteer_id: Uuid,
) -> Result<Vec<Student>, DbError> {
    let students = sqlx::query_as::<_, StudentRow>(
        "SELECT id, volunteer_id, name, email, phone, academic_level, created_at \
         FROM students \
         WHERE volunteer_id = $1 \
         ORDER BY id",
    )
    .bind(volunteer_id)
    .fetch_all(&mut *conn)
    .await?;

    if students.is_empty() {
        return Ok(Vec::new());
    }

    let subjects = sqlx::query_as::<_, SubjectRow>(
        "SELECT ss.student_id, ss.name, ss.min_lectures \
         FROM student_subjects ss \
         JOIN students s ON s.id = ss.student_id \
         WHERE s.volunteer_id = $1 \
         ORDER BY ss.id",
    )
    .bind(volunteer_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_student: BTreeMap<i64, Vec<SubjectQuota>> = BTreeMap::new();
    for subject in subjects {
        by_student
            .entry(subject.student_id)
            .or_default()
            .push(SubjectQuota {
                name: subject.name,
                min_lectures: subject.min_lectures,
            });
    }

    Ok(students
        .into_iter()
        .map(|row| Student {
            subjects: by_student.remove(&row.id).unwrap_or_default(),
            name: row.name,
            email: row.email,
            academic_level: row.academic_level,
        })
        .collect())
}

/// Find a student on a volunteer's roster by email, case-insensitively.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_student_by_email(
    executor: impl PgExecutor<'_>,
    volunteer_id: Uuid,
    email: &str,
) -> Result<Option<StudentRow>, DbError> {
    let row = sqlx::query_as::<_, StudentRow>(
        "SELECT id, volunteer_id, name, email, phone, academic_level, created_at \
         FROM students \
         WHERE volunteer_id = $1 AND email = $2",
    )
    .bind(volunteer_id)
    .bind(normalize_email(email))
    .fetch_optional(executor)
    .await?;

    Ok(row)
}
