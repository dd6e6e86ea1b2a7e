//! Run a scan with a `compliance_runs` ledger entry around it.

use chrono::{DateTime, FixedOffset, Utc};
use sqlx::PgPool;

use crate::error::ComplianceError;
use crate::reports::regenerate;
use crate::types::{RunMode, ScanOutcome};

/// Create → start → scan → complete/fail.
///
/// A scan failure is recorded on the run before being returned.
///
/// # Errors
///
/// Returns [`ComplianceError`] if the ledger cannot be written or the scan fails.
pub async fn run_recorded(
    pool: &PgPool,
    now: DateTime<Utc>,
    calendar: FixedOffset,
    mode: RunMode,
    trigger_source: &str,
) -> Result<ScanOutcome, ComplianceError> {
    let run = tutordesk_db::create_compliance_run(pool, mode.as_str(), trigger_source).await?;
    if let Err(e) = tutordesk_db::start_compliance_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, &e.to_string()).await;
        return Err(e.into());
    }

    match regenerate(pool, now, calendar, mode).await {
        Ok(outcome) => {
            let flagged = i32::try_from(outcome.members_flagged()).unwrap_or(i32::MAX);
            tutordesk_db::complete_compliance_run(pool, run.id, outcome.window.start(), flagged)
                .await?;
            Ok(outcome)
        }
        Err(e) => {
            fail_run_best_effort(pool, run.id, &e.to_string()).await;
            Err(e)
        }
    }
}

async fn fail_run_best_effort(pool: &PgPool, run_id: i64, message: &str) {
    if let Err(e) = tutordesk_db::fail_compliance_run(pool, run_id, message).await {
        tracing::error!(run_id, error = %e, "compliance: failed to mark run as failed");
    }
}
