// # Persistence
//
// Key-value store implementations and the search string bridge built on
// top of them.

pub mod file;
pub mod memory;
pub mod search;

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use search::{SEARCH_KEY, SearchPersistence};

use std::sync::Arc;

use crate::config::PersistenceConfig;
use crate::error::Result;
use crate::traits::KeyValueStore;

/// Build the store selected by configuration
pub async fn open_store(config: &PersistenceConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config {
        PersistenceConfig::Memory => Ok(Arc::new(MemoryKeyValueStore::new())),
        PersistenceConfig::File { path } => Ok(Arc::new(FileKeyValueStore::open(path).await?)),
    }
}
