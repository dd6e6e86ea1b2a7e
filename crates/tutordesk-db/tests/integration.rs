//! Offline unit tests for tutordesk-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::FixedOffset;
use rust_decimal::Decimal;
use tutordesk_core::{AppConfig, Environment, Lecture};
use tutordesk_db::{ComplianceRunRow, LectureRow, NotificationKind, PoolConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        roster_path: PathBuf::from("./config/roster.yaml"),
        api_key_hash_salt: Some("salt".to_string()),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        calendar_offset: FixedOffset::east_opt(3 * 3600).unwrap(),
        compliance_cron: "0 0 0 * * Sat".to_string(),
        rate_limit_per_minute: 120,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`ComplianceRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn compliance_run_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = ComplianceRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        mode: "scheduled".to_string(),
        trigger_source: "scheduler".to_string(),
        status: "queued".to_string(),
        week_start: None,
        started_at: None,
        completed_at: None,
        records_processed: 0_i32,
        error_message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.mode, "scheduled");
    assert_eq!(row.status, "queued");
    assert!(row.week_start.is_none());
    assert_eq!(row.records_processed, 0);
}

#[test]
fn lecture_row_converts_into_core_lecture() {
    use chrono::Utc;
    use uuid::Uuid;

    let now = Utc::now();
    let row = LectureRow {
        id: Uuid::new_v4(),
        volunteer_id: Uuid::new_v4(),
        name: "Fractions".to_string(),
        subject: "Math".to_string(),
        student_email: "sara@example.com".to_string(),
        link: "https://drive.example.com/l/1".to_string(),
        lecture_date: None,
        duration: Decimal::new(15, 1),
        created_at: now,
    };
    let id = row.id;

    let lecture = Lecture::from(row);
    assert_eq!(lecture.id, id);
    assert_eq!(lecture.effective_date(), now);
    assert_eq!(lecture.duration, Decimal::new(15, 1));
}

#[test]
fn notification_kinds_match_schema_values() {
    assert_eq!(NotificationKind::LectureAdded.as_str(), "lecture_added");
    assert_eq!(
        NotificationKind::LowLectureCountPerSubject.as_str(),
        "low_lecture_count_per_subject"
    );
}
