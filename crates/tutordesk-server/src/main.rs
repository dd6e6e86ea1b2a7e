mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, per_minute_rate_limit, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(tutordesk_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = tutordesk_db::PoolConfig::from_app_config(&config);
    let pool = tutordesk_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = tutordesk_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations up to date");

    let _scheduler = scheduler::build_scheduler(pool.clone(), Arc::clone(&config)).await?;

    let auth = AuthState::from_env(
        matches!(config.env, tutordesk_core::Environment::Development),
        config.api_key_hash_salt.as_deref(),
    )?;
    let rate_limit = per_minute_rate_limit(config.rate_limit_per_minute);
    let app = build_app(
        AppState {
            pool,
            calendar: config.calendar_offset,
        },
        auth,
        rate_limit,
    );

    tracing::info!(
        bind_addr = %config.bind_addr,
        env = %config.env,
        calendar = %config.calendar_offset,
        "tutordesk-server listening"
    );
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
