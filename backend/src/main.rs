//! Jingle accounts backend
//!
//! User-account API: signup, login, edit, delete and lookup, with
//! expiring auth keys held in memory.
//!
//! ## Architecture
//!
//! - Routes: HTTP request handling and routing
//! - Services: account rules on top of the auth core
//! - Repositories: PostgreSQL (SQLx) or an in-memory store
//! - Auth: password digests and the auth key store

use anyhow::Result;
use jingle_backend::{auth, config, db, routes, state::AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting Jingle accounts backend"
    );

    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Failed to install metrics recorder: {}. /metrics will be unavailable.", e);
            None
        }
    };

    // Migrations run here outside production; production uses a separate job
    let users = db::connect_repository(&config.database, !config::AppConfig::is_production()).await?;

    let mut state = AppState::new(users, config.clone());
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    let sweeper = auth::spawn_sweeper(
        state.auth().tokens().clone(),
        Duration::from_secs(config.auth.sweep_interval_secs),
    );

    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "jingle_backend=info,tower_http=info".into()
        } else {
            "jingle_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for log aggregation
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Refuse to start in production with an unfit configuration
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let problems = config.production_problems();

    if let Some(url) = config.database.url.as_deref() {
        if url.contains("localhost") || url.contains("127.0.0.1") {
            warn!("Database URL contains localhost - ensure this is intentional for production");
        }
    }

    if !problems.is_empty() {
        for problem in &problems {
            error!("Configuration error: {}", problem);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
