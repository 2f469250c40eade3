//! Planly
//!
//! Main application entry point

use std::sync::Arc;
use tracing::{info, warn};

use planly::{
    config::Settings,
    utils::logging,
    database::{create_pool, run_migrations, DatabaseService},
    services::ServiceFactory,
    state::AppContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard flushes the log file on shutdown
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", planly::info());

    // Initialize database connection
    info!("Connecting to database...");
    let pool = create_pool(&settings.database).await?;
    run_migrations(&pool).await?;

    let database_service = Arc::new(DatabaseService::new(pool));

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::from_settings(&settings, database_service).await?;

    let bind_address = settings.bind_address();
    let app = planly::router(AppContext::new(settings, services));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "Planly is ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Planly has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
