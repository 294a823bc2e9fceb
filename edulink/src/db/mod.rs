//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx over SQLite.
//! It follows the Repository pattern to provide clean abstractions over
//! database operations:
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! Repositories wrap a `&mut SqliteConnection`, so they compose with both
//! pool connections and transactions. Migrations are managed by SQLx and
//! located in the `migrations/` directory; [`crate::migrator`] provides
//! access to the migrator.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::DatabaseConfig;

pub mod errors;
pub mod handlers;
pub mod models;

/// Open a connection pool for the configured database.
///
/// Foreign keys are enforced on every connection; the database file is
/// created on first start.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    // In-memory databases cannot use WAL
    let journal_mode = if config.url.contains(":memory:") {
        SqliteJournalMode::Memory
    } else {
        SqliteJournalMode::Wal
    };

    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(journal_mode);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}
