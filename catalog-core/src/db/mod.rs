//! Database Module
//!
//! Handles the SQLite connection pool and migrations

pub mod repository;

use crate::core::Config;
use crate::utils::{CatalogError, CatalogResult};
use sqlx::{Sqlite, SqlitePool, Transaction};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;
use std::time::Duration;

/// Database service: owns the SQLite connection pool
#[derive(Debug, Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open (creating if missing) the configured database and apply migrations
    pub async fn new(config: &Config) -> CatalogResult<Self> {
        let pool = if config.is_in_memory() {
            Self::memory_pool(config).await?
        } else {
            Self::file_pool(config).await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(path = %config.database_path, "Catalog migrations applied");

        Ok(Self { pool })
    }

    /// Fresh, private in-memory database
    pub async fn in_memory() -> CatalogResult<Self> {
        Self::new(&Config::in_memory()).await
    }

    /// Start a write transaction holding the write lock from the first statement
    ///
    /// A deferred `BEGIN` that reads before writing fails with
    /// `SQLITE_BUSY_SNAPSHOT` when another writer commits in between; taking
    /// the lock up front makes writers queue on the busy timeout instead.
    pub async fn begin_write(&self) -> CatalogResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    async fn file_pool(config: &Config) -> CatalogResult<SqlitePool> {
        // WAL, foreign keys, normal sync
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.database_path))
            .map_err(|e| CatalogError::Config(format!("Invalid database path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            // busy_timeout: 写冲突时等待而非立即失败
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .optimize_on_close(true, None);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        tracing::info!(
            path = %config.database_path,
            busy_timeout_ms = config.busy_timeout_ms,
            "Database connection established (SQLite WAL)"
        );
        Ok(pool)
    }

    /// An in-memory database lives exactly as long as its connection, so the
    /// pool holds a single connection that never idles out.
    async fn memory_pool(config: &Config) -> CatalogResult<SqlitePool> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CatalogError::Config(format!("Invalid database path: {e}")))?
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        tracing::debug!("In-memory database opened");
        Ok(pool)
    }
}
