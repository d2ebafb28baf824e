// # Key-Value Store Trait
//
// Defines the interface for small client-side persistence.
//
// ## Purpose
//
// The dashboard persists exactly one value across sessions: the search
// string. It is restored at startup and written on every change.
//
// ## Implementations
//
// - In-memory: `MemoryKeyValueStore` (tests, ephemeral sessions)
// - File-based: `FileKeyValueStore` (versioned JSON with backup recovery)

use async_trait::async_trait;

/// A stored value with its last modification time
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoredValue {
    /// The value as written
    pub value: String,
    /// Timestamp of the last write
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl StoredValue {
    /// Wrap a value, stamped with the current time
    pub(crate) fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            updated_at: chrono::Utc::now(),
        }
    }
}

/// Trait for key-value store implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
/// Implementations may buffer writes; `flush()` must persist everything
/// pending.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: The stored value
    /// - `Ok(None)`: Nothing stored under this key
    /// - `Err(Error)`: Storage error
    async fn get(&self, key: &str) -> Result<Option<String>, crate::Error>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<(), crate::Error>;

    /// Remove `key` (succeeds if it did not exist)
    async fn remove(&self, key: &str) -> Result<(), crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
