// Storage layer for the Worklane billing core.
// Typed row models plus transaction-aware repository functions over sqlx.

pub mod config;
pub mod models;
pub mod repositories;

// Re-export commonly used items
pub use chrono;
pub use config::DatabaseConfig;
pub use sqlx;
pub use uuid;

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Database connection manager.
///
/// Constructed once at process start and injected into the services that
/// need it; the pool is the only shared mutable resource in the system.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database instance from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Requires a running Postgres with DATABASE_URL set.
    #[tokio::test]
    #[ignore]
    async fn test_database_connection() {
        let config = DatabaseConfig::from_env();
        let db = Database::new(&config).await;
        assert!(db.is_ok());
    }
}
