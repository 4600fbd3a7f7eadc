//! Duet Server: real-time one-on-one chat.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use duet_core::config::{AppConfig, StoreProvider};
use duet_core::error::AppError;
use duet_database::{ChatStore, DatabasePool, MemoryChatStore, PgChatStore};
use duet_realtime::{CloseReason, RealtimeEngine};

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
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the `DUET_ENV` overlay, and `DUET__*` variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("DUET_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
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
    tracing::info!("Starting Duet v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Durable store ────────────────────────────────────
    let (store, db_pool): (Arc<dyn ChatStore>, Option<DatabasePool>) =
        match config.database.provider {
            StoreProvider::Postgres => {
                let pool = DatabasePool::connect(&config.database).await?;
                if config.database.run_migrations {
                    duet_database::migration::run_migrations(pool.pool()).await?;
                }
                let store: Arc<dyn ChatStore> = Arc::new(PgChatStore::new(pool.clone()));
                (store, Some(pool))
            }
            StoreProvider::Memory => {
                tracing::warn!("Using in-memory store; data is lost on exit");
                let store: Arc<dyn ChatStore> = Arc::new(MemoryChatStore::new());
                (store, None)
            }
        };

    // ── Step 2: Real-time engine ─────────────────────────────────
    let realtime = RealtimeEngine::new(config.realtime.clone(), store.clone());

    // ── Step 3: HTTP server ──────────────────────────────────────
    let addr = config.server.bind_address();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = duet_api::AppState::new(config, store, realtime.clone());
    let app = duet_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("Duet server listening on {}", addr);

    // ── Step 4: Graceful shutdown ────────────────────────────────
    let signal_engine = realtime.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            // Upgraded sockets are not tracked by the HTTP server; close them here.
            signal_engine.close_all(CloseReason::ServerShutdown);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    realtime.shutdown(grace).await;
    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("Duet server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
