//! SQLite database connection pool management.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to create pool: {0}")]
    PoolCreationFailed(#[source] sqlx::Error),
    #[error("Invalid database path: {0}")]
    InvalidDatabasePath(String),
    #[error("Failed to create directory: {0}")]
    DirectoryCreationFailed(#[source] std::io::Error),
    #[error("Migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),
}

pub async fn create_pool(database_path: &str, max_connections: u32) -> Result<SqlitePool, ConnectionError> {
    ensure_database_directory(database_path)?;

    let connect_options = SqliteConnectOptions::from_str(database_path)
        .map_err(|_| ConnectionError::InvalidDatabasePath(database_path.to_string()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(connect_options)
        .await
        .map_err(ConnectionError::PoolCreationFailed)?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(ConnectionError::MigrationFailed)?;

    Ok(pool)
}

fn ensure_database_directory(database_path: &str) -> Result<(), ConnectionError> {
    let path = database_path
        .strip_prefix("sqlite://")
        .or_else(|| database_path.strip_prefix("sqlite:"))
        .unwrap_or(database_path);

    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(ConnectionError::DirectoryCreationFailed)?;
        }
    }
    Ok(())
}
