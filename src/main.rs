//! KeyStock Server: license key inventory service
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use keystock_core::config::AppConfig;
use keystock_core::error::AppError;
use keystock_core::traits::MirrorStore;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("KEYSTOCK_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    let env = std::env::var("KEYSTOCK_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load(&config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting KeyStock v{}", env!("CARGO_PKG_VERSION"));

    if config.inventory.owners.is_empty() {
        tracing::warn!(
            "No owners configured (inventory.owners); grants, clearing, and reports are unavailable"
        );
    }
    if config.logging.log_full_key {
        tracing::warn!("logging.log_full_key is enabled; key values will appear unmasked in logs");
    }

    // ── Step 1: Database connection + migrations ─────────────────
    let db = keystock_database::DatabasePool::connect(&config.database).await?;
    keystock_database::migration::run_migrations(db.pool()).await?;

    // ── Step 2: Mirror directory ─────────────────────────────────
    tracing::info!(mirror_dir = %config.inventory.mirror_dir, "Initializing mirror store");
    let mirror: Arc<dyn MirrorStore> = Arc::new(
        keystock_storage::LocalMirrorStore::new(&config.inventory.mirror_dir).await?,
    );

    // ── Step 3: Services + HTTP server ───────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);

    let app_state = keystock_api::AppState::new(config, db.clone(), mirror);
    let app = keystock_api::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("KeyStock server listening on {}", addr);

    // ── Step 4: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if tokio::time::timeout(grace, db.close()).await.is_err() {
        tracing::warn!("Database pool did not close within the shutdown grace period");
    }

    tracing::info!("KeyStock server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
