//! Search string persistence
//!
//! Bridges the view model's search string to a [`KeyValueStore`] under a
//! fixed key. Persistence is best effort: a store that cannot be read
//! yields an empty search, and failed writes are reported to the caller
//! but never change the in-memory search.

use std::sync::Arc;

use crate::error::Result;
use crate::traits::KeyValueStore;

/// Key under which the search string is stored
pub const SEARCH_KEY: &str = "meshping_search";

/// Persists and restores the search string
#[derive(Clone)]
pub struct SearchPersistence {
    store: Arc<dyn KeyValueStore>,
}

impl SearchPersistence {
    /// Wrap a key-value store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Restore the search string saved by a previous session
    ///
    /// Returns an empty string if nothing was saved or the store failed.
    pub async fn restore(&self) -> String {
        match self.store.get(SEARCH_KEY).await {
            Ok(Some(search)) => {
                tracing::debug!("Restored search '{}'", search);
                search
            }
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!("Failed to restore search, starting unfiltered: {}", e);
                String::new()
            }
        }
    }

    /// Save the current search string
    pub async fn save(&self, search: &str) -> Result<()> {
        self.store.set(SEARCH_KEY, search).await
    }

    /// Flush the underlying store
    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }
}
