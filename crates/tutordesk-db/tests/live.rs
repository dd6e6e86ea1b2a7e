//! Live integration tests for tutordesk-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/tutordesk-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use tutordesk_core::{
    FlaggedMember, MembershipStatus, RosterStudent, RosterSubject, RosterVolunteer,
};
use tutordesk_db::{
    adjust_lecture_count, adjust_volunteer_hours, complete_compliance_run, create_compliance_run,
    delete_lecture_row, delete_notification, fail_compliance_run,
    get_membership_by_email, get_volunteer, get_weekly_report, insert_lecture,
    insert_shortfall_notification, list_compliance_runs, list_lectures, list_notifications,
    list_scan_volunteers, load_students, mark_all_notifications_read, seed_roster,
    set_low_lecture_streak, start_compliance_run, update_weekly_report_members,
    upsert_weekly_report, DbError, NewLecture,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn roster() -> Vec<RosterVolunteer> {
    vec![
        RosterVolunteer {
            name: "Huda Salem".to_string(),
            email: "Huda@Example.com".to_string(),
            membership: Some(MembershipStatus::Approved),
            volunteer_hours: Decimal::new(3, 0),
            students: vec![RosterStudent {
                name: "Sara".to_string(),
                email: "Sara@Example.com".to_string(),
                phone: None,
                academic_level: Some("grade 9".to_string()),
                subjects: vec![
                    RosterSubject {
                        name: "Math".to_string(),
                        min_lectures: 2,
                    },
                    RosterSubject {
                        name: "Physics".to_string(),
                        min_lectures: 1,
                    },
                ],
            }],
        },
        RosterVolunteer {
            name: "No Membership".to_string(),
            email: "none@example.com".to_string(),
            membership: None,
            volunteer_hours: Decimal::ZERO,
            students: vec![],
        },
    ]
}

async fn seeded_volunteer_id(pool: &sqlx::PgPool) -> Uuid {
    seed_roster(pool, &roster()).await.expect("seed failed");
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM volunteers WHERE email = 'huda@example.com'")
        .fetch_one(pool)
        .await
        .expect("seeded volunteer missing")
}

fn new_lecture(volunteer_id: Uuid) -> NewLecture<'static> {
    NewLecture {
        volunteer_id,
        name: "Fractions",
        subject: "Math",
        student_email: "SARA@example.com",
        link: "https://drive.example.com/l/1",
        lecture_date: None,
        duration: Decimal::new(15, 1),
    }
}

fn flagged(id: Uuid) -> FlaggedMember {
    FlaggedMember {
        id,
        name: "Huda Salem".to_string(),
        email: "huda@example.com".to_string(),
        low_lecture_streak: 1,
        under_target_students: vec![],
        lectures: vec![],
    }
}

// ---------------------------------------------------------------------------
// Section 1: Seeding and directory reads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn seed_roster_is_idempotent_and_normalizes_emails(pool: sqlx::PgPool) {
    let first = seed_roster(&pool, &roster()).await.expect("first seed");
    let second = seed_roster(&pool, &roster()).await.expect("second seed");
    assert_eq!(first, second);
    assert_eq!(first.volunteers, 2);
    assert_eq!(first.memberships, 1);
    assert_eq!(first.subjects, 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM volunteers")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let membership = get_membership_by_email(&pool, "HUDA@example.com")
        .await
        .unwrap()
        .expect("membership present");
    assert_eq!(membership.email, "huda@example.com");
    assert_eq!(membership.status, MembershipStatus::Approved.as_str());
}

#[sqlx::test(migrations = "../../migrations")]
async fn scan_volunteers_join_membership(pool: sqlx::PgPool) {
    seed_roster(&pool, &roster()).await.unwrap();

    let rows = list_scan_volunteers(&pool).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].email, "huda@example.com");
    assert_eq!(rows[0].membership_status.as_deref(), Some("approved"));
    assert_eq!(rows[0].membership_name.as_deref(), Some("Huda Salem"));
    assert!(rows[1].membership_status.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn admins_are_not_scanned(pool: sqlx::PgPool) {
    sqlx::query("INSERT INTO volunteers (id, email, name, role) VALUES ($1, 'root@example.com', 'Root', 'admin')")
        .bind(Uuid::new_v4())
        .execute(&pool)
        .await
        .unwrap();

    assert!(list_scan_volunteers(&pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn load_students_groups_subjects(pool: sqlx::PgPool) {
    let id = seeded_volunteer_id(&pool).await;
    let mut conn = pool.acquire().await.unwrap();

    let students = load_students(&mut conn, id).await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].email, "sara@example.com");
    let names: Vec<&str> = students[0].subjects.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Math", "Physics"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn streak_fields_round_trip(pool: sqlx::PgPool) {
    let id = seeded_volunteer_id(&pool).await;
    let week = Utc.with_ymd_and_hms(2026, 10, 9, 21, 0, 0).unwrap();

    set_low_lecture_streak(&pool, id, 2, Some(week)).await.unwrap();
    let row = get_volunteer(&pool, id).await.unwrap();
    assert_eq!(row.low_lecture_streak, 2);
    assert_eq!(row.last_flagged_week, Some(week));

    let err = set_low_lecture_streak(&pool, Uuid::new_v4(), 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

// ---------------------------------------------------------------------------
// Section 2: Lectures and counters
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn lecture_insert_stores_lowercase_email_and_delete_returns_row(pool: sqlx::PgPool) {
    let id = seeded_volunteer_id(&pool).await;

    let lecture = insert_lecture(&pool, &new_lecture(id)).await.unwrap();
    assert_eq!(lecture.student_email, "sara@example.com");
    assert_eq!(list_lectures(&pool, id).await.unwrap().len(), 1);

    let deleted = delete_lecture_row(&pool, lecture.id).await.unwrap();
    assert_eq!(deleted.id, lecture.id);
    assert!(matches!(
        delete_lecture_row(&pool, lecture.id).await,
        Err(DbError::NotFound)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn counters_floor_at_zero(pool: sqlx::PgPool) {
    let id = seeded_volunteer_id(&pool).await;

    adjust_lecture_count(&pool, id, 1).await.unwrap();
    adjust_lecture_count(&pool, id, -1).await.unwrap();
    adjust_lecture_count(&pool, id, -1).await.unwrap();
    assert_eq!(get_volunteer(&pool, id).await.unwrap().lecture_count, 0);

    adjust_volunteer_hours(&pool, "huda@example.com", Decimal::new(-10, 0))
        .await
        .unwrap();
    let membership = get_membership_by_email(&pool, "huda@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(membership.volunteer_hours, Decimal::ZERO);
}

// ---------------------------------------------------------------------------
// Section 3: Notifications
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn shortfall_notification_is_unique_per_pair(pool: sqlx::PgPool) {
    let id = seeded_volunteer_id(&pool).await;

    let first = insert_shortfall_notification(&pool, id, "sara@example.com", "Math", 2, 1, "low")
        .await
        .unwrap();
    let second = insert_shortfall_notification(&pool, id, "sara@example.com", "Math", 2, 0, "low")
        .await
        .unwrap();
    let other_subject =
        insert_shortfall_notification(&pool, id, "sara@example.com", "Physics", 1, 0, "low")
            .await
            .unwrap();

    assert!(first);
    assert!(!second);
    assert!(other_subject);
    assert_eq!(list_notifications(&pool, id).await.unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn mark_read_and_delete_scope_to_owner(pool: sqlx::PgPool) {
    let id = seeded_volunteer_id(&pool).await;
    insert_shortfall_notification(&pool, id, "sara@example.com", "Math", 2, 1, "low")
        .await
        .unwrap();

    assert_eq!(mark_all_notifications_read(&pool, id).await.unwrap(), 1);
    assert_eq!(mark_all_notifications_read(&pool, id).await.unwrap(), 0);

    let notification = list_notifications(&pool, id).await.unwrap().remove(0);
    assert!(notification.is_read);

    let err = delete_notification(&pool, Uuid::new_v4(), notification.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
    delete_notification(&pool, id, notification.id).await.unwrap();
    assert!(list_notifications(&pool, id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Section 4: Weekly reports
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn weekly_report_upsert_keeps_one_row_and_last_writer_wins(pool: sqlx::PgPool) {
    let start = Utc.with_ymd_and_hms(2026, 10, 9, 21, 0, 0).unwrap();
    let end = start + Duration::days(7) - Duration::milliseconds(1);
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    let first = upsert_weekly_report(&pool, start, end, &[flagged(a)], 10)
        .await
        .unwrap();
    let second = upsert_weekly_report(&pool, start, end, &[flagged(a), flagged(b)], 11)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.created_at, second.created_at);
    assert_eq!(second.members_with_low_lectures, 2);
    assert_eq!(second.total_users_processed, 11);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM weekly_reports")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let stored = get_weekly_report(&pool, start).await.unwrap().unwrap();
    assert_eq!(stored.members.0.len(), 2);
    assert_eq!(stored.members.0[1].id, b);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_members_rewrites_snapshot(pool: sqlx::PgPool) {
    let start = Utc.with_ymd_and_hms(2026, 10, 9, 21, 0, 0).unwrap();
    let end = start + Duration::days(7) - Duration::milliseconds(1);
    let report = upsert_weekly_report(&pool, start, end, &[flagged(Uuid::new_v4())], 3)
        .await
        .unwrap();

    let updated = update_weekly_report_members(&pool, report.id, &[], 0)
        .await
        .unwrap();
    assert!(updated.members.0.is_empty());
    assert_eq!(updated.members_with_low_lectures, 0);
    assert_eq!(updated.total_users_processed, 3);
}

// ---------------------------------------------------------------------------
// Section 5: Compliance run ledger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn compliance_run_lifecycle_queued_to_succeeded(pool: sqlx::PgPool) {
    let run = create_compliance_run(&pool, "scheduled", "scheduler")
        .await
        .expect("create_compliance_run failed");
    assert_eq!(run.status, "queued");

    start_compliance_run(&pool, run.id).await.expect("start failed");
    let week = Utc.with_ymd_and_hms(2026, 10, 9, 21, 0, 0).unwrap();
    complete_compliance_run(&pool, run.id, week, 4)
        .await
        .expect("complete failed");

    let runs = list_compliance_runs(&pool, 10).await.expect("list failed");
    let fetched = runs.iter().find(|r| r.id == run.id).expect("run listed");
    assert_eq!(fetched.status, "succeeded");
    assert_eq!(fetched.week_start, Some(week));
    assert_eq!(fetched.records_processed, 4);
    assert!(fetched.completed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn compliance_run_cannot_fail_directly_from_queued(pool: sqlx::PgPool) {
    let run = create_compliance_run(&pool, "lazy", "cli").await.unwrap();

    let err = fail_compliance_run(&pool, run.id, "boom")
        .await
        .expect_err("failing a queued run should fail");
    assert!(matches!(
        err,
        DbError::InvalidRunTransition {
            expected_status: "running",
            ..
        }
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_compliance_runs_is_newest_first(pool: sqlx::PgPool) {
    let older = create_compliance_run(&pool, "lazy", "cli").await.unwrap();
    let newer = create_compliance_run(&pool, "scheduled", "scheduler")
        .await
        .unwrap();

    let runs = list_compliance_runs(&pool, 10).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].id, newer.id);
    assert_eq!(runs[1].id, older.id);
    assert_eq!(list_compliance_runs(&pool, 1).await.unwrap().len(), 1);
}
