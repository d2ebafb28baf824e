// # File Key-Value Store
//
// File-based implementation of KeyValueStore that survives restarts.
//
// ## Crash Recovery
//
// - Atomic writes: write to `<path>.tmp`, then rename over the real file
// - Backup: the previous file is copied to `<path>.backup` before each write
// - Recovery: an unparseable file is replaced by its backup; if the backup is
//   unusable too, the store starts empty
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "entries": {
//     "meshping_search": {
//       "value": "core",
//       "updated_at": "2026-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::key_value_store::{KeyValueStore, StoredValue};

/// Store file format version
const STORE_FILE_VERSION: &str = "1.0";

/// File-based key-value store with backup recovery
///
/// Every `set` and `remove` is written through to disk immediately.
///
/// # Example
///
/// ```rust,no_run
/// use meshping_core::persistence::FileKeyValueStore;
/// use meshping_core::traits::KeyValueStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileKeyValueStore::open("/var/lib/meshping-dash/state.json").await?;
///     store.set("meshping_search", "core").await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

#[derive(Debug, Default)]
struct FileState {
    entries: HashMap<String, StoredValue>,
    dirty: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoreFileFormat {
    version: String,
    entries: HashMap<String, StoredValue>,
}

/// Why a store file could not be loaded
enum LoadError {
    /// The file exists but does not hold valid store JSON
    Corrupted(Error),
    /// The file could not be read at all
    Unreadable(Error),
}

impl FileKeyValueStore {
    /// Open or create a file store
    ///
    /// Creates missing parent directories, loads the file if present and
    /// falls back to the backup when the file is corrupted.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let entries = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                entries,
                dirty: false,
            })),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_with_recovery(path: &Path) -> Result<HashMap<String, StoredValue>, Error> {
        match Self::load(path).await {
            Ok(entries) => {
                tracing::debug!("Loaded {} stored value(s) from {}", entries.len(), path.display());
                Ok(entries)
            }
            Err(LoadError::Unreadable(e)) => Err(e),
            Err(LoadError::Corrupted(e)) => {
                tracing::warn!("Store file corrupted: {}. Attempting recovery from backup.", e);

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty store.");
                    return Ok(HashMap::new());
                }

                match Self::load(&backup_path).await {
                    Ok(entries) => {
                        tracing::info!("Recovered {} stored value(s) from backup", entries.len());
                        if let Err(e) = fs::copy(&backup_path, path).await {
                            tracing::error!("Failed to restore store file from backup: {}", e);
                        }
                        Ok(entries)
                    }
                    Err(LoadError::Corrupted(e) | LoadError::Unreadable(e)) => {
                        tracing::error!("Backup unusable too: {}. Starting with empty store.", e);
                        Ok(HashMap::new())
                    }
                }
            }
        }
    }

    async fn load(path: &Path) -> Result<HashMap<String, StoredValue>, LoadError> {
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            LoadError::Unreadable(Error::persistence(format!(
                "Failed to read store file {}: {}",
                path.display(),
                e
            )))
        })?;

        let file: StoreFileFormat = serde_json::from_str(&content).map_err(|e| {
            LoadError::Corrupted(Error::persistence(format!(
                "Failed to parse store file {}: {}",
                path.display(),
                e
            )))
        })?;

        if file.version != STORE_FILE_VERSION {
            tracing::warn!(
                "Store file version mismatch: expected {}, got {}. Loading anyway.",
                STORE_FILE_VERSION,
                file.version
            );
        }

        Ok(file.entries)
    }

    /// Write all entries atomically (temp file + rename)
    async fn write(&self) -> Result<(), Error> {
        let mut state = self.state.write().await;

        let file = StoreFileFormat {
            version: STORE_FILE_VERSION.to_string(),
            entries: state.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let temp_path = self.temp_path();
        {
            let mut temp = fs::File::create(&temp_path).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            temp.write_all(json.as_bytes()).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            temp.flush().await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await
        {
            tracing::warn!("Failed to create backup: {}", e);
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::persistence(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        state.dirty = false;
        tracing::trace!("Store written to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let state = self.state.read().await;
        Ok(state.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            state.entries.insert(key.to_string(), StoredValue::new(value));
            state.dirty = true;
        }
        self.write().await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            if state.entries.remove(key).is_none() {
                return Ok(());
            }
            state.dirty = true;
        }
        self.write().await
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty { self.write().await } else { Ok(()) }
    }
}
