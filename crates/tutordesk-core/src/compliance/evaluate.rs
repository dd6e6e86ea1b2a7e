use crate::volunteers::{normalize_email, Lecture, Student, VolunteerSnapshot};

use super::report::{
    FlaggedMember, LectureSnapshot, UnderTargetStudent, UnderTargetSubject,
    UNSPECIFIED_ACADEMIC_LEVEL,
};
use super::window::ComplianceWindow;

/// Every student of `volunteer` with at least one subject below quota for `window`.
///
/// An empty result means the volunteer is fully compliant (or has nothing to
/// evaluate). Students without subject quotas never appear.
#[must_use]
pub fn evaluate_volunteer(
    volunteer: &VolunteerSnapshot,
    window: &ComplianceWindow,
) -> Vec<UnderTargetStudent> {
    volunteer
        .students
        .iter()
        .filter_map(|student| evaluate_student(student, &volunteer.lectures, window))
        .collect()
}

fn evaluate_student(
    student: &Student,
    lectures: &[Lecture],
    window: &ComplianceWindow,
) -> Option<UnderTargetStudent> {
    let student_email = normalize_email(&student.email);

    let under_target_subjects: Vec<UnderTargetSubject> = student
        .subjects
        .iter()
        .filter_map(|quota| {
            let delivered = count_delivered(lectures, &student_email, &quota.name, window);
            (delivered < quota.min_lectures).then(|| UnderTargetSubject {
                name: quota.name.clone(),
                min_lectures: quota.min_lectures,
                delivered_lectures: delivered,
            })
        })
        .collect();

    if under_target_subjects.is_empty() {
        return None;
    }

    let student_name = if student.name.trim().is_empty() {
        "Name not available".to_string()
    } else {
        student.name.clone()
    };

    Some(UnderTargetStudent {
        student_name,
        student_email,
        academic_level: student
            .academic_level
            .as_deref()
            .map(str::trim)
            .filter(|level| !level.is_empty())
            .unwrap_or(UNSPECIFIED_ACADEMIC_LEVEL)
            .to_string(),
        under_target_subjects,
    })
}

/// Lectures for `student_email` (already normalized) in exactly `subject`
/// whose effective date falls inside the window.
fn count_delivered(
    lectures: &[Lecture],
    student_email: &str,
    subject: &str,
    window: &ComplianceWindow,
) -> i32 {
    let count = lectures
        .iter()
        .filter(|lecture| {
            lecture.subject == subject
                && normalize_email(&lecture.student_email) == student_email
                && window.contains(lecture.effective_date())
        })
        .count();
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Freeze a flagged volunteer into the report snapshot.
///
/// `streak` is the counter value as of generation time, after any scheduled
/// increment has been applied.
#[must_use]
pub fn flag_member(
    volunteer: &VolunteerSnapshot,
    under_target_students: Vec<UnderTargetStudent>,
    streak: i32,
) -> FlaggedMember {
    FlaggedMember {
        id: volunteer.id,
        name: if volunteer.name.trim().is_empty() {
            volunteer.email.clone()
        } else {
            volunteer.name.clone()
        },
        email: volunteer.email.clone(),
        low_lecture_streak: streak,
        under_target_students,
        lectures: volunteer.lectures.iter().map(LectureSnapshot::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::volunteers::{MembershipStatus, SubjectQuota};

    fn window() -> ComplianceWindow {
        ComplianceWindow::starting_on(
            NaiveDate::from_ymd_opt(2026, 10, 10).unwrap(),
            FixedOffset::east_opt(3 * 3600).unwrap(),
        )
    }

    fn lecture(subject: &str, student_email: &str, at: DateTime<Utc>) -> Lecture {
        Lecture {
            id: Uuid::new_v4(),
            name: format!("{subject} session"),
            subject: subject.to_string(),
            student_email: student_email.to_string(),
            link: "https://drive.example.com/l".to_string(),
            lecture_date: Some(at),
            duration: Decimal::ONE,
            created_at: at,
        }
    }

    fn volunteer(students: Vec<Student>, lectures: Vec<Lecture>) -> VolunteerSnapshot {
        VolunteerSnapshot {
            id: Uuid::new_v4(),
            email: "v@example.com".to_string(),
            name: "Volunteer V".to_string(),
            membership_status: Some(MembershipStatus::Approved),
            low_lecture_streak: 0,
            last_flagged_week: None,
            students,
            lectures,
        }
    }

    fn student_s(quotas: &[(&str, i32)]) -> Student {
        Student {
            name: "Student S".to_string(),
            email: "s@example.com".to_string(),
            academic_level: None,
            subjects: quotas
                .iter()
                .map(|(name, min)| SubjectQuota {
                    name: (*name).to_string(),
                    min_lectures: *min,
                })
                .collect(),
        }
    }

    fn inside() -> DateTime<Utc> {
        window().start() + Duration::days(2)
    }

    #[test]
    fn one_of_two_required_lectures_is_a_shortfall() {
        let v = volunteer(
            vec![student_s(&[("Math", 2)])],
            vec![lecture("Math", "s@example.com", inside())],
        );
        let result = evaluate_volunteer(&v, &window());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].student_email, "s@example.com");
        assert_eq!(
            result[0].under_target_subjects,
            vec![UnderTargetSubject {
                name: "Math".to_string(),
                min_lectures: 2,
                delivered_lectures: 1,
            }]
        );
    }

    #[test]
    fn meeting_the_quota_is_compliant() {
        let v = volunteer(
            vec![student_s(&[("Math", 2)])],
            vec![
                lecture("Math", "s@example.com", inside()),
                lecture("Math", "s@example.com", inside() + Duration::hours(3)),
            ],
        );
        assert!(evaluate_volunteer(&v, &window()).is_empty());
    }

    #[test]
    fn lectures_outside_the_window_do_not_count() {
        let v = volunteer(
            vec![student_s(&[("Math", 1)])],
            vec![
                lecture("Math", "s@example.com", window().start() - Duration::days(8)),
                lecture("Math", "s@example.com", window().end() + Duration::milliseconds(1)),
            ],
        );
        let result = evaluate_volunteer(&v, &window());
        assert_eq!(result[0].under_target_subjects[0].delivered_lectures, 0);
    }

    #[test]
    fn window_bounds_count() {
        let v = volunteer(
            vec![student_s(&[("Math", 2)])],
            vec![
                lecture("Math", "s@example.com", window().start()),
                lecture("Math", "s@example.com", window().end()),
            ],
        );
        assert!(evaluate_volunteer(&v, &window()).is_empty());
    }

    #[test]
    fn student_email_matches_case_insensitively_but_subject_exactly() {
        let v = volunteer(
            vec![student_s(&[("Math", 1), ("Physics", 1)])],
            vec![
                lecture("Math", "  S@Example.com", inside()),
                lecture("physics", "s@example.com", inside()),
            ],
        );
        let result = evaluate_volunteer(&v, &window());
        assert_eq!(result.len(), 1);
        let names: Vec<&str> = result[0]
            .under_target_subjects
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Physics"]);
    }

    #[test]
    fn lectures_for_other_students_do_not_count() {
        let v = volunteer(
            vec![student_s(&[("Math", 1)])],
            vec![lecture("Math", "other@example.com", inside())],
        );
        assert_eq!(evaluate_volunteer(&v, &window()).len(), 1);
    }

    #[test]
    fn created_at_is_used_when_lecture_date_is_missing() {
        let mut late = lecture("Math", "s@example.com", inside());
        late.lecture_date = None;
        late.created_at = inside();
        let v = volunteer(vec![student_s(&[("Math", 1)])], vec![late]);
        assert!(evaluate_volunteer(&v, &window()).is_empty());
    }

    #[test]
    fn students_without_subjects_and_zero_quotas_are_compliant() {
        let v = volunteer(vec![student_s(&[]), student_s(&[("Art", 0)])], vec![]);
        assert!(evaluate_volunteer(&v, &window()).is_empty());
    }

    #[test]
    fn academic_level_defaults_to_unspecified() {
        let mut student = student_s(&[("Math", 1)]);
        student.academic_level = Some("   ".to_string());
        let v = volunteer(vec![student], vec![]);
        assert_eq!(
            evaluate_volunteer(&v, &window())[0].academic_level,
            UNSPECIFIED_ACADEMIC_LEVEL
        );
    }

    #[test]
    fn flag_member_snapshots_full_lecture_log() {
        let v = volunteer(
            vec![student_s(&[("Math", 2)])],
            vec![
                lecture("Math", "s@example.com", inside()),
                lecture("Math", "s@example.com", window().start() - Duration::days(30)),
            ],
        );
        let students = evaluate_volunteer(&v, &window());
        let member = flag_member(&v, students, 3);
        assert_eq!(member.id, v.id);
        assert_eq!(member.name, "Volunteer V");
        assert_eq!(member.low_lecture_streak, 3);
        assert_eq!(member.lectures.len(), 2);
        assert_eq!(member.under_target_students.len(), 1);
    }

    #[test]
    fn flag_member_falls_back_to_email_for_name() {
        let mut v = volunteer(vec![], vec![]);
        v.name = String::new();
        assert_eq!(flag_member(&v, vec![], 0).name, "v@example.com");
    }
}
