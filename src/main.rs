//! PawHaven auth daemon.
//!
//! Wires the authentication crates over in-memory stores and runs the
//! expired-session sweep until shutdown. A host application embeds
//! [`pawhaven_auth::AuthService`] directly; this binary exists to run the
//! sweep and to smoke-test a configuration.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use pawhaven_auth::{
    AuthService, LoggingDelivery, MemoryAccountRepository, MemorySessionRepository,
    PasswordHasher,
};
use pawhaven_core::clock::SystemClock;
use pawhaven_core::config::AppConfig;
use pawhaven_core::error::AppError;

#[tokio::main]
async fn main() {
    let env = std::env::var("PAWHAVEN_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Auth daemon error: {}", e);
        std::process::exit(1);
    }
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

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting PawHaven auth v{}", env!("CARGO_PKG_VERSION"));

    let service = AuthService::new(
        &config,
        Arc::new(MemoryAccountRepository::new()),
        Arc::new(MemorySessionRepository::new()),
        Arc::new(PasswordHasher::new()),
        Arc::new(LoggingDelivery),
        Arc::new(SystemClock),
    )?;
    let cleanup = service.cleanup();

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let interval = Duration::from_secs(config.session.cleanup_interval_minutes.saturating_mul(60));

    let sweeper = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = cleanup.run_cleanup().await {
                        tracing::error!(error = %e, "Session cleanup failed");
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }
    });

    tracing::info!(
        interval_minutes = config.session.cleanup_interval_minutes,
        "Session sweep started"
    );

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping...");
    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(10), sweeper).await;

    tracing::info!("PawHaven auth shut down");
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
