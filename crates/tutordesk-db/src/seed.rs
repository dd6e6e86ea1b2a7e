use sqlx::PgPool;
use tutordesk_core::{normalize_email, RosterVolunteer};
use uuid::Uuid;

use crate::memberships::upsert_membership;
use crate::DbError;

/// Row counts written by [`seed_roster`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub volunteers: usize,
    pub memberships: usize,
    pub students: usize,
    pub subjects: usize,
}

/// Upsert volunteers, memberships, students and quotas from the roster file.
///
/// All upserts run inside a single transaction; if any operation fails the
/// entire batch is rolled back. A student's quotas are replaced wholesale so
/// subjects removed from the file disappear from the database. Streaks,
/// lecture counts and the lecture log are never touched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_roster(
    pool: &PgPool,
    volunteers: &[RosterVolunteer],
) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for volunteer in volunteers {
        let email = normalize_email(&volunteer.email);

        let volunteer_id: Uuid = sqlx::query_scalar(
            "INSERT INTO volunteers (id, email, name, role) \
             VALUES ($1, $2, $3, 'volunteer') \
             ON CONFLICT (email) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 updated_at = NOW() \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&volunteer.name)
        .fetch_one(&mut *tx)
        .await?;
        summary.volunteers += 1;

        if let Some(status) = volunteer.membership {
            upsert_membership(
                &mut *tx,
                &email,
                &volunteer.name,
                status,
                volunteer.volunteer_hours,
            )
            .await?;
            summary.memberships += 1;
        }

        for student in &volunteer.students {
            let student_id: i64 = sqlx::query_scalar(
                "INSERT INTO students (volunteer_id, name, email, phone, academic_level) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (volunteer_id, email) DO UPDATE SET \
                     name = EXCLUDED.name, \
                     phone = EXCLUDED.phone, \
                     academic_level = EXCLUDED.academic_level \
                 RETURNING id",
            )
            .bind(volunteer_id)
            .bind(&student.name)
            .bind(normalize_email(&student.email))
            .bind(&student.phone)
            .bind(&student.academic_level)
            .fetch_one(&mut *tx)
            .await?;
            summary.students += 1;

            sqlx::query("DELETE FROM student_subjects WHERE student_id = $1")
                .bind(student_id)
                .execute(&mut *tx)
                .await?;

            for subject in &student.subjects {
                sqlx::query(
                    "INSERT INTO student_subjects (student_id, name, min_lectures) \
                     VALUES ($1, $2, $3)",
                )
                .bind(student_id)
                .bind(&subject.name)
                .bind(subject.min_lectures)
                .execute(&mut *tx)
                .await?;
                summary.subjects += 1;
            }
        }
    }

    tx.commit().await?;
    Ok(summary)
}
