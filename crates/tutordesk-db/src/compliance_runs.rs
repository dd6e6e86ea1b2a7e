//! Database operations for the `compliance_runs` ledger.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `compliance_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ComplianceRunRow {
    pub id: i64,
    pub public_id: Uuid,
    /// `scheduled` or `lazy`.
    pub mode: String,
    /// `scheduler`, `cli` or `api`.
    pub trigger_source: String,
    pub status: String,
    pub week_start: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Members flagged by the run.
    pub records_processed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

const RUN_COLUMNS: &str = "id, public_id, mode, trigger_source, status, week_start, \
     started_at, completed_at, records_processed, error_message, created_at";

/// Creates a new compliance run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_compliance_run(
    pool: &PgPool,
    mode: &str,
    trigger_source: &str,
) -> Result<ComplianceRunRow, DbError> {
    let row = sqlx::query_as::<_, ComplianceRunRow>(&format!(
        "INSERT INTO compliance_runs (public_id, mode, trigger_source, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(mode)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `queued`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_compliance_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE compliance_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` and records the week it covered.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_compliance_run(
    pool: &PgPool,
    id: i64,
    week_start: DateTime<Utc>,
    records_processed: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE compliance_runs \
         SET status = 'succeeded', completed_at = NOW(), week_start = $1, records_processed = $2 \
         WHERE id = $3 AND status = 'running'",
    )
    .bind(week_start)
    .bind(records_processed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, sets `completed_at = NOW()` and `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_compliance_run(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE compliance_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_compliance_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ComplianceRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ComplianceRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM compliance_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
