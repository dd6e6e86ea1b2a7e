//! Weekly low-lecture report commands.
//!
//! `run` and `remove` write; `show` generates the report lazily if the week
//! has none yet; `runs` reads the ledger.

use chrono::Utc;
use clap::Subcommand;
use sqlx::PgPool;
use tutordesk_compliance::RunMode;
use tutordesk_core::{AppConfig, WeeklyReport};

/// Sub-commands available under `compliance`.
#[derive(Debug, Subcommand)]
pub enum ComplianceCommands {
    /// Run the weekly scan for the most recently completed week
    Run {
        /// Rebuild the report only; leave streaks and notifications untouched
        #[arg(long)]
        lazy: bool,
    },
    /// Print the current week's report as JSON
    Show,
    /// Remove one member from the current week's report
    Remove {
        /// Volunteer id of the member to remove
        #[arg(long)]
        member: String,
    },
    /// List recent scan runs
    Runs {
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

pub(crate) async fn run_compliance_scan(
    pool: &PgPool,
    config: &AppConfig,
    lazy: bool,
) -> anyhow::Result<()> {
    let mode = if lazy {
        RunMode::Lazy
    } else {
        RunMode::Scheduled
    };

    let outcome =
        tutordesk_compliance::run_recorded(pool, Utc::now(), config.calendar_offset, mode, "cli")
            .await?;

    println!("week: {}", outcome.window);
    println!("mode: {}", outcome.mode);
    println!("{}", outcome.report.summary_message());
    println!(
        "scanned {} volunteer(s); streaks +{} / reset {}; {} notification(s) opened",
        outcome.report.total_users_processed,
        outcome.streaks_incremented,
        outcome.streaks_reset,
        outcome.notifications_created
    );
    Ok(())
}

pub(crate) async fn run_show(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let report =
        tutordesk_compliance::current_report(pool, Utc::now(), config.calendar_offset).await?;
    println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    Ok(())
}

pub(crate) async fn run_remove(
    pool: &PgPool,
    config: &AppConfig,
    member: &str,
) -> anyhow::Result<()> {
    let report =
        tutordesk_compliance::remove_member(pool, Utc::now(), config.calendar_offset, member)
            .await?;
    println!(
        "removed {member}; {} member(s) remain in the report",
        report.members_with_low_lectures
    );
    Ok(())
}

pub(crate) async fn run_list_runs(pool: &PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = tutordesk_db::list_compliance_runs(pool, limit.clamp(1, 200)).await?;
    if runs.is_empty() {
        println!("no compliance runs recorded");
        return Ok(());
    }

    println!(
        "{:<36}  {:<9}  {:<9}  {:<9}  {:>7}  {:<20}",
        "run", "mode", "trigger", "status", "flagged", "created"
    );
    for run in runs {
        println!(
            "{:<36}  {:<9}  {:<9}  {:<9}  {:>7}  {:<20}",
            run.public_id,
            run.mode,
            run.trigger_source,
            run.status,
            run.records_processed,
            run.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
        if let Some(message) = run.error_message {
            println!("    error: {message}");
        }
    }
    Ok(())
}

fn report_json(report: &WeeklyReport) -> serde_json::Value {
    serde_json::json!({
        "message": report.summary_message(),
        "members": report.members,
        "debug": {
            "totalUsersProcessed": report.total_users_processed,
            "weekStart": report.week_start,
            "weekEnd": report.week_end,
            "membersWithLowLectures": report.members_with_low_lectures,
        },
    })
}
