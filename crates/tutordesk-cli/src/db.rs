//! `db` command handlers.

use std::path::Path;

use sqlx::PgPool;

pub(crate) async fn run_ping(pool: &PgPool) -> anyhow::Result<()> {
    tutordesk_db::ping(pool).await?;
    println!("database reachable");
    Ok(())
}

pub(crate) async fn run_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = tutordesk_db::run_migrations(pool).await?;
    tracing::info!(applied, "migrations complete");
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Load and validate the roster file, then upsert it in one transaction.
pub(crate) async fn run_seed(pool: &PgPool, path: &Path) -> anyhow::Result<()> {
    let roster = tutordesk_core::load_roster(path)?;
    tracing::info!(
        path = %path.display(),
        volunteers = roster.volunteers.len(),
        "seeding roster"
    );

    let summary = tutordesk_db::seed_roster(pool, &roster.volunteers).await?;
    println!(
        "seeded {} volunteer(s), {} membership(s), {} student(s), {} subject quota(s)",
        summary.volunteers, summary.memberships, summary.students, summary.subjects
    );
    Ok(())
}
