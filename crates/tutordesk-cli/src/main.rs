mod compliance;
mod db;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::compliance::ComplianceCommands;

#[derive(Debug, Parser)]
#[command(name = "tutordesk-cli")]
#[command(about = "Tutordesk command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Weekly low-lecture report
    Compliance {
        #[command(subcommand)]
        command: ComplianceCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert volunteers, memberships and rosters from a YAML file
    Seed {
        /// Roster file (defaults to `TUTORDESK_ROSTER_PATH`)
        #[arg(long)]
        roster: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("tutordesk-cli: run with --help to list commands");
        return Ok(());
    };

    let config = tutordesk_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = tutordesk_db::PoolConfig::from_app_config(&config);
    let pool = tutordesk_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => db::run_ping(&pool).await,
            DbCommands::Migrate => db::run_migrate(&pool).await,
            DbCommands::Seed { roster } => {
                let path = roster.unwrap_or_else(|| config.roster_path.clone());
                db::run_seed(&pool, &path).await
            }
        },
        Commands::Compliance { command } => match command {
            ComplianceCommands::Run { lazy } => {
                compliance::run_compliance_scan(&pool, &config, lazy).await
            }
            ComplianceCommands::Show => compliance::run_show(&pool, &config).await,
            ComplianceCommands::Remove { member } => {
                compliance::run_remove(&pool, &config, &member).await
            }
            ComplianceCommands::Runs { limit } => compliance::run_list_runs(&pool, limit).await,
        },
    }
}
