use anyhow::{Context, Result};
use shared::{
    config::{ConnectionManager, ConnectionPool},
    utils::{LogOptions, Telemetry, init_logger},
};
use tracing::{error, info};
use wholesaler::{
    config::Config, handler::AppRouter, scheduler::run_notification_sweeper, state::AppState,
};

const SERVICE_NAME: &str = "wholesaler-service";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = Config::init().context("Failed to load configuration")?;

    let telemetry = match config.otel_endpoint.as_deref() {
        Some(endpoint) => Some(
            Telemetry::init(SERVICE_NAME, endpoint).context("Failed to initialize telemetry")?,
        ),
        None => None,
    };

    let _log_guard = init_logger(
        telemetry.as_ref().map(Telemetry::logger_provider),
        SERVICE_NAME,
        LogOptions::from_env(),
    );

    let db_pool = ConnectionManager::new_pool(
        &config.database_url,
        config.db_min_conn,
        config.db_max_conn,
    )
    .await
    .context("Failed to initialize database pool")?;

    if config.run_migrations {
        run_migrations(&db_pool)
            .await
            .context("Failed to run database migrations")?;
    }

    let state = AppState::new(db_pool, &config).context("Failed to create AppState")?;

    let sweeper = config.notification.sweep_interval.map(|every| {
        tokio::spawn(run_notification_sweeper(
            state.di_container.notification_service.clone(),
            every,
        ))
    });

    info!("✅ Application setup completed successfully.");

    let result = AppRouter::serve(config.port, state).await;

    if let Some(handle) = sweeper {
        handle.abort();
    }

    if let Some(telemetry) = telemetry {
        if let Err(e) = telemetry.shutdown() {
            error!("Failed to shutdown telemetry: {e}");
        }
    }

    info!("✅ Wholesaler service shutdown complete.");
    result
}

async fn run_migrations(pool: &ConnectionPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;

    Ok(())
}
