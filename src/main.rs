//! Recipe API server
//!
//! Loads configuration, prepares the database and media directory, creates the
//! configured admin account and serves the HTTP API until shutdown.

use recipe_api::{api, auth, core, db};

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (handles CLI args, env vars, and config file)
    let config = match core::config::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Print error to stderr since logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!("Starting Recipe API v{}", env!("CARGO_PKG_VERSION"));
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Server configuration"
    );
    info!(path = ?config.database.path, "Database configuration");
    info!(
        media_root = ?config.storage.media_root,
        media_url = %config.storage.media_url,
        "Storage configuration"
    );

    info!("Initializing database...");
    let db = Arc::new(
        db::DatabaseManager::new(
            &config.database.path,
            config.database.connection_pool_size as u32,
            Duration::from_millis(config.database.busy_timeout),
        )
        .context("Failed to initialize database")?,
    );
    info!("Database initialized successfully");

    let state = api::handlers::AppState::new(config, db).context("Failed to prepare media storage")?;

    auth::ensure_admin(&state.user_repo, &state.config.admin, &state.config.security)
        .await
        .context("Failed to create admin account")?;

    let server = api::ApiServer::new(state);
    info!("Server ready - starting to serve requests");

    server.serve().await
}
