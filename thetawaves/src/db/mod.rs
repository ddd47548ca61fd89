//! Credential and song storage.
//!
//! The auth flow and the song list only talk to the [`UserRepository`] and
//! [`SongRepository`] traits. Two implementations ship: PostgreSQL through a
//! sqlx pool, and an in-process [`MemoryStore`] for development and tests.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod memory;
pub mod repository;
pub mod timeouts;

pub use config::DatabaseConfig;
pub use memory::MemoryStore;
pub use repository::{PgSongRepository, PgUserRepository, SongRepository, UserRepository};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use thetawaves::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let db = Database::new(&DatabaseConfig::development()).await?;
    ///     db.migrate().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled schema. Safe to run on every start.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        let run = async {
            sqlx::migrate!("./migrations")
                .run(&self.pool)
                .await
                .map_err(sqlx::Error::from)
        };
        timeouts::with_timeout(timeouts::MIGRATION_TIMEOUT, run)
            .await
            .map_err(|e| match e {
                timeouts::TimeoutError::Database(e) => e,
                timeouts::TimeoutError::Timeout(_) => sqlx::Error::PoolTimedOut,
            })
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}
