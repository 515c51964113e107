//! Durable key/value storage trait

use crate::error::Result;
use async_trait::async_trait;

/// Durable key/value store holding serialized session records
///
/// This trait abstracts the persistence backend so the engine can run
/// against `SQLite`, browser-style local storage, or an in-memory map.
/// Values are opaque strings (the engine stores JSON).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// Returns `Ok(None)` if nothing is stored.
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`
    ///
    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
