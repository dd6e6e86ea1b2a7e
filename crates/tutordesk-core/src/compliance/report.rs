use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::volunteers::Lecture;

/// Shown when a student has no academic level on file.
pub const UNSPECIFIED_ACADEMIC_LEVEL: &str = "unspecified";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderTargetSubject {
    pub name: String,
    pub min_lectures: i32,
    pub delivered_lectures: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderTargetStudent {
    pub student_name: String,
    pub student_email: String,
    pub academic_level: String,
    pub under_target_subjects: Vec<UnderTargetSubject>,
}

/// A lecture as it looked when the report was generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureSnapshot {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub student_email: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    /// Effective date: the scheduled date, or `created_at` when none was given.
    pub lecture_date: DateTime<Utc>,
    pub duration: Decimal,
}

impl From<&Lecture> for LectureSnapshot {
    fn from(lecture: &Lecture) -> Self {
        Self {
            id: lecture.id,
            name: lecture.name.clone(),
            subject: lecture.subject.clone(),
            student_email: lecture.student_email.clone(),
            link: lecture.link.clone(),
            created_at: lecture.created_at,
            lecture_date: lecture.effective_date(),
            duration: lecture.duration,
        }
    }
}

/// A volunteer flagged in a weekly report, frozen at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedMember {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub low_lecture_streak: i32,
    pub under_target_students: Vec<UnderTargetStudent>,
    pub lectures: Vec<LectureSnapshot>,
}

/// One persisted report per compliance week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyReport {
    pub id: i64,
    pub week_start: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
    pub members: Vec<FlaggedMember>,
    pub total_users_processed: i32,
    pub members_with_low_lectures: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeeklyReport {
    /// Drop a member from the snapshot and refresh the flagged count.
    ///
    /// Returns `false` when no member with `member_id` is present.
    pub fn remove_member(&mut self, member_id: Uuid) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != member_id);
        if self.members.len() == before {
            return false;
        }
        self.members_with_low_lectures = i32::try_from(self.members.len()).unwrap_or(i32::MAX);
        true
    }

    #[must_use]
    pub fn summary_message(&self) -> String {
        if self.members.is_empty() {
            "All members meet the minimum weekly lecture requirements".to_string()
        } else {
            format!(
                "Found {} members with low lecture counts",
                self.members.len()
            )
        }
    }
}
