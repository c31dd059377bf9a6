//! SQLite persistence: connection pool, schema migration, and loaded-row views.
//!
//! Writes go straight to the database; operations that must read and write atomically
//! (registration, team sheets) run inside a `pool.begin()` transaction whose first
//! statement is a write, so SQLite serializes them.

mod tables;

pub use tables::Tables;

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub type DbPool = Pool<Sqlite>;

/// Open (creating if needed) the database at `database_url`, e.g. `sqlite:data/halisaha.db`.
pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    if let Some(db_path) = database_url.strip_prefix("sqlite:") {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;
    log::info!("Connected to {}", database_url);
    Ok(pool)
}

/// Private in-memory database on a single connection (tests, demos). Migrated already.
pub async fn memory_pool() -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    let migration_sql = include_str!("migrations/001_initial_schema.sql");

    sqlx::query(migration_sql).execute(pool).await?;

    log::info!("Database migrations completed successfully");
    Ok(())
}
