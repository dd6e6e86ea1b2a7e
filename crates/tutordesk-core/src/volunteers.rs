//! Directory types the compliance engine reads: volunteers, their students,
//! subject quotas, and the delivered-lecture log.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

/// Approval state of a volunteer's membership (join request).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Approved,
    Rejected,
}

impl MembershipStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Approved => "approved",
            MembershipStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MembershipStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MembershipStatus::Pending),
            "approved" => Ok(MembershipStatus::Approved),
            "rejected" => Ok(MembershipStatus::Rejected),
            other => Err(CoreError::InvalidMembershipStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectQuota {
    pub name: String,
    /// Minimum lectures per compliance week.
    pub min_lectures: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub name: String,
    pub email: String,
    pub academic_level: Option<String>,
    pub subjects: Vec<SubjectQuota>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecture {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub student_email: String,
    pub link: String,
    pub lecture_date: Option<DateTime<Utc>>,
    /// Hours.
    pub duration: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Lecture {
    /// The instant counted against the compliance week: the scheduled date
    /// when present, otherwise the creation time.
    #[must_use]
    pub fn effective_date(&self) -> DateTime<Utc> {
        self.lecture_date.unwrap_or(self.created_at)
    }
}

/// Everything the compliance scan needs to know about one volunteer.
#[derive(Debug, Clone)]
pub struct VolunteerSnapshot {
    pub id: Uuid,
    pub email: String,
    /// Display name; the membership name when one exists.
    pub name: String,
    pub membership_status: Option<MembershipStatus>,
    pub low_lecture_streak: i32,
    pub last_flagged_week: Option<DateTime<Utc>>,
    pub students: Vec<Student>,
    pub lectures: Vec<Lecture>,
}

impl VolunteerSnapshot {
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.membership_status == Some(MembershipStatus::Approved)
    }
}

/// Lower-case and trim an email for case-insensitive comparison.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
