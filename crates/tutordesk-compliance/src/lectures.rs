//! Lecture log writes and the counters they maintain.

use chrono::{DateTime, Utc};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tutordesk_core::normalize_email;
use tutordesk_db::{DbError, LectureRow, NewLecture, NewNotification, NotificationKind};
use uuid::Uuid;

use crate::error::ComplianceError;

const MAX_TEXT_LEN: usize = 100;

/// Largest duration the `NUMERIC(6, 2)` column holds.
const MAX_DURATION: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2);

/// A lecture as submitted by a volunteer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureInput {
    pub name: String,
    pub subject: String,
    pub student_email: String,
    pub link: String,
    pub lecture_date: Option<DateTime<Utc>>,
    pub duration: Decimal,
}

impl LectureInput {
    /// # Errors
    ///
    /// Returns [`ComplianceError::Validation`] describing the first bad field.
    pub fn validate(&self) -> Result<(), ComplianceError> {
        check_text("name", &self.name)?;
        check_text("subject", &self.subject)?;

        let email = self.student_email.trim();
        let email_ok = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !email_ok {
            return Err(ComplianceError::Validation(
                "studentEmail must be a valid email address".to_string(),
            ));
        }

        let link_ok = Url::parse(self.link.trim())
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host());
        if !link_ok {
            return Err(ComplianceError::Validation(
                "link must be an absolute http(s) URL".to_string(),
            ));
        }

        if self.duration <= Decimal::ZERO {
            return Err(ComplianceError::Validation(
                "duration must be greater than zero".to_string(),
            ));
        }
        // The column keeps two decimal places, so round before comparing.
        if self.duration.round_dp(2) > MAX_DURATION {
            return Err(ComplianceError::Validation(format!(
                "duration must be at most {MAX_DURATION}"
            )));
        }

        Ok(())
    }
}

fn check_text(field: &str, value: &str) -> Result<(), ComplianceError> {
    let len = value.trim().chars().count();
    if len == 0 || len > MAX_TEXT_LEN {
        return Err(ComplianceError::Validation(format!(
            "{field} must be between 1 and {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

/// Record a delivered lecture for `volunteer_id`.
///
/// In one transaction: insert the lecture, bump the lecture count, add the
/// duration to the membership's hours, clear the pair's open shortfall
/// notice, and leave a `lecture_added` notice.
///
/// # Errors
///
/// Returns [`ComplianceError::Validation`] for bad input,
/// [`ComplianceError::NotFound`] if the volunteer, the student or the
/// membership is missing, or [`ComplianceError::Db`] on storage failure.
pub async fn add_lecture(
    pool: &PgPool,
    volunteer_id: Uuid,
    input: &LectureInput,
) -> Result<LectureRow, ComplianceError> {
    input.validate()?;

    let mut tx = pool.begin().await?;

    let volunteer = tutordesk_db::get_volunteer(&mut *tx, volunteer_id)
        .await
        .map_err(|e| not_found_as(e, "volunteer not found"))?;

    let student_email = normalize_email(&input.student_email);
    if tutordesk_db::find_student_by_email(&mut *tx, volunteer_id, &student_email)
        .await?
        .is_none()
    {
        return Err(ComplianceError::NotFound(format!(
            "student {student_email} is not assigned to this volunteer"
        )));
    }

    if tutordesk_db::get_membership_by_email(&mut *tx, &volunteer.email)
        .await?
        .is_none()
    {
        return Err(ComplianceError::NotFound(
            "membership not found for volunteer".to_string(),
        ));
    }

    let name = input.name.trim();
    let subject = input.subject.trim();
    let link = input.link.trim();

    let lecture = tutordesk_db::insert_lecture(
        &mut *tx,
        &NewLecture {
            volunteer_id,
            name,
            subject,
            student_email: &student_email,
            link,
            lecture_date: input.lecture_date,
            duration: input.duration,
        },
    )
    .await?;

    tutordesk_db::adjust_lecture_count(&mut *tx, volunteer_id, 1).await?;
    tutordesk_db::adjust_volunteer_hours(&mut *tx, &volunteer.email, input.duration).await?;
    tutordesk_db::delete_shortfall_notifications(&mut *tx, volunteer_id, &student_email, subject)
        .await?;

    let message = format!(
        "New lecture added by {}: {name} ({subject}) - {link}",
        volunteer.email
    );
    tutordesk_db::insert_notification(
        &mut *tx,
        &NewNotification {
            volunteer_id,
            kind: NotificationKind::LectureAdded,
            message: &message,
            student_email: Some(&student_email),
            subject: Some(subject),
            min_lectures: None,
            current_lectures: None,
            link: Some(link),
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        volunteer = %volunteer_id,
        lecture = %lecture.id,
        subject,
        "lectures: lecture recorded"
    );

    Ok(lecture)
}

/// Delete a lecture and roll back the counters it contributed.
///
/// # Errors
///
/// Returns [`ComplianceError::NotFound`] if the lecture does not exist, or
/// [`ComplianceError::Db`] on storage failure.
pub async fn delete_lecture(pool: &PgPool, lecture_id: Uuid) -> Result<LectureRow, ComplianceError> {
    let mut tx = pool.begin().await?;

    let lecture = tutordesk_db::delete_lecture_row(&mut *tx, lecture_id)
        .await
        .map_err(|e| not_found_as(e, "lecture not found"))?;

    tutordesk_db::adjust_lecture_count(&mut *tx, lecture.volunteer_id, -1).await?;

    let volunteer = tutordesk_db::get_volunteer(&mut *tx, lecture.volunteer_id).await?;
    match tutordesk_db::adjust_volunteer_hours(&mut *tx, &volunteer.email, -lecture.duration).await
    {
        Ok(()) | Err(DbError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    tx.commit().await?;

    tracing::info!(
        volunteer = %lecture.volunteer_id,
        lecture = %lecture.id,
        "lectures: lecture deleted"
    );

    Ok(lecture)
}

fn not_found_as(e: DbError, message: &str) -> ComplianceError {
    match e {
        DbError::NotFound => ComplianceError::NotFound(message.to_string()),
        other => ComplianceError::Db(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> LectureInput {
        LectureInput {
            name: "Fractions".to_string(),
            subject: "Math".to_string(),
            student_email: "Sara@Example.com".to_string(),
            link: "https://drive.example.com/l/1".to_string(),
            lecture_date: None,
            duration: Decimal::ONE,
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn rejects_relative_or_non_http_links() {
        for link in ["drive.example.com/l/1", "ftp://example.com/x", "/l/1"] {
            let mut bad = input();
            bad.link = link.to_string();
            assert!(
                matches!(bad.validate(), Err(ComplianceError::Validation(ref m)) if m.contains("link")),
                "{link} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_blank_and_overlong_text() {
        let mut bad = input();
        bad.name = "   ".to_string();
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.subject = "x".repeat(MAX_TEXT_LEN + 1);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_duration_and_bad_email() {
        let mut bad = input();
        bad.duration = Decimal::ZERO;
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.student_email = "sara".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn rejects_duration_the_column_cannot_hold() {
        let mut ok = input();
        ok.duration = MAX_DURATION;
        assert!(ok.validate().is_ok());

        for raw in ["10000", "9999.995", "123456.7"] {
            let mut bad = input();
            bad.duration = raw.parse().unwrap();
            assert!(
                matches!(bad.validate(), Err(ComplianceError::Validation(ref m)) if m == "duration must be at most 9999.99"),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn deserializes_camel_case_body() {
        let body = serde_json::json!({
            "name": "Fractions",
            "subject": "Math",
            "studentEmail": "sara@example.com",
            "link": "https://drive.example.com/l/1",
            "lectureDate": "2026-10-12T15:00:00Z",
            "duration": "1.5"
        });
        let parsed: LectureInput = serde_json::from_value(body).expect("deserialize");
        assert_eq!(parsed.duration, Decimal::new(15, 1));
        assert!(parsed.lecture_date.is_some());
    }
}
