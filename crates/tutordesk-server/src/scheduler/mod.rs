//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the weekly
//! compliance scan.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tutordesk_compliance::RunMode;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<tutordesk_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    scheduler.add(compliance_job(pool, config)?).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// The weekly low-lecture scan.
///
/// Fires on `compliance_cron` evaluated in the configured calendar offset
/// (Saturday 00:00 by default) and runs the engine in scheduled mode, so
/// streaks advance and shortfall notices are opened.
fn compliance_job(
    pool: PgPool,
    config: Arc<tutordesk_core::AppConfig>,
) -> Result<Job, JobSchedulerError> {
    let pool = Arc::new(pool);
    let calendar = config.calendar_offset;

    Job::new_async_tz(config.compliance_cron.as_str(), calendar, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            tracing::info!("scheduler: starting weekly compliance scan");
            match tutordesk_compliance::run_recorded(
                &pool,
                Utc::now(),
                calendar,
                RunMode::Scheduled,
                "scheduler",
            )
            .await
            {
                Ok(outcome) => tracing::info!(
                    week_start = %outcome.window.start(),
                    members = outcome.members_flagged(),
                    streaks_incremented = outcome.streaks_incremented,
                    streaks_reset = outcome.streaks_reset,
                    notifications = outcome.notifications_created,
                    "scheduler: weekly compliance scan complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: weekly compliance scan failed"),
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use tokio_cron_scheduler::Job;

    #[test]
    fn default_compliance_cron_is_accepted() {
        let calendar = FixedOffset::east_opt(3 * 3600).expect("offset");
        let job = Job::new_async_tz("0 0 0 * * Sat", calendar, |_uuid, _lock| {
            Box::pin(async {})
        });
        assert!(job.is_ok());
    }

    #[test]
    fn malformed_cron_is_rejected() {
        let calendar = FixedOffset::east_opt(0).expect("offset");
        let job = Job::new_async_tz("every saturday", calendar, |_uuid, _lock| {
            Box::pin(async {})
        });
        assert!(job.is_err());
    }
}
