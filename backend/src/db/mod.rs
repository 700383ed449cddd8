//! Database connection and account store selection
//!
//! Accounts live in PostgreSQL when `database.url` is configured and in
//! process memory otherwise. The auth key store is always in memory and is
//! not handled here.

use crate::config::DatabaseConfig;
use crate::repositories::{MemoryUserRepository, PgUserRepository, UserRepository};
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Pool tuning applied on top of [`DatabaseConfig`]
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),  // 10 minutes
            max_lifetime: Duration::from_secs(1800), // 30 minutes
        }
    }
}

/// Create a PostgreSQL connection pool
pub async fn create_pool(url: &str, max_connections: u32, options: &PoolOptions) -> Result<PgPool> {
    let connect_options = PgConnectOptions::from_str(url)
        .context("Invalid database URL")?
        .application_name("jingle-accounts");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(options.min_connections.min(max_connections))
        .acquire_timeout(options.acquire_timeout)
        .idle_timeout(options.idle_timeout)
        .max_lifetime(options.max_lifetime)
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await?;

    info!(max = max_connections, "Database pool created");

    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed successfully");
    Ok(())
}

/// Check database health
pub async fn health_check(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            warn!("Database health check failed: {}", e);
            e.into()
        })
}

/// Build the account repository described by `config`
///
/// With a URL this connects, optionally migrates, and returns the
/// PostgreSQL repository; without one it returns an empty in-memory store.
pub async fn connect_repository(
    config: &DatabaseConfig,
    migrate: bool,
) -> Result<Arc<dyn UserRepository>> {
    match config.url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => {
            info!("Connecting to database...");
            let pool = create_pool(url, config.max_connections, &PoolOptions::default()).await?;
            if migrate {
                run_migrations(&pool).await?;
            }
            Ok(Arc::new(PgUserRepository::new(pool)))
        }
        None => {
            warn!("No database URL configured; accounts are kept in memory and lost on restart");
            Ok(Arc::new(MemoryUserRepository::new()))
        }
    }
}
