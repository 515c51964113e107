//! `SQLite` session store
//!
//! One row per key. Values are written whole; the last write wins.

use crate::error::StorageError;
use async_trait::async_trait;
use cadence_core::SessionStore;
use sqlx::{Row, SqlitePool};
use tracing::trace;

/// Session store backed by the `session_store` table
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Wrap a pool that has already been migrated
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database at `database_url` and migrate it
    pub async fn connect(database_url: &str) -> crate::Result<Self> {
        let pool = crate::create_pool(database_url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        crate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Unix timestamp of the last write to `key`
    pub async fn updated_at(&self, key: &str) -> crate::Result<Option<i64>> {
        let row = sqlx::query("SELECT updated_at FROM session_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get::<i64, _>("updated_at")))
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, key: &str) -> cadence_core::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM session_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|row| row.get::<String, _>("value")))
    }

    async fn save(&self, key: &str, value: &str) -> cadence_core::Result<()> {
        let now = chrono::Utc::now().timestamp();
        trace!(key, bytes = value.len(), "Writing session record");

        sqlx::query(
            "INSERT INTO session_store (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> cadence_core::Result<()> {
        sqlx::query("DELETE FROM session_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
