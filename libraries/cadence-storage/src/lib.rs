//! Cadence Storage
//!
//! Durable backends for the playback session record.
//!
//! Both stores implement [`cadence_core::SessionStore`], so the playback
//! engine never sees which one it is talking to:
//!
//! - [`SqliteSessionStore`] keeps records in a `SQLite` database and survives
//!   restarts
//! - [`MemorySessionStore`] keeps records in a map, for tests and for
//!   sessions that should not outlive the process
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_core::SessionStore;
//! use cadence_storage::{create_pool, run_migrations, SqliteSessionStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://cadence.db").await?;
//! run_migrations(&pool).await?;
//!
//! let store = SqliteSessionStore::new(pool);
//! store.save("playback-session", "{}").await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod sqlite;

pub use error::{Result, StorageError};
pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://cadence.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> std::result::Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    debug!(url = database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    debug!("SQLite pool ready");
    Ok(pool)
}
