//! State snapshot stores.
//!
//! A store supplies the restored initial state when a container is built and
//! receives every distinct state afterwards (see
//! [`ContainerBuilder::persist_with`](crate::container::ContainerBuilder::persist_with)).
//! Snapshots are JSON documents produced by `serde_json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Key under which [`MemoryStore`] keeps the snapshot by default.
pub const DEFAULT_STATE_KEY: &str = "mvi_state";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to access state file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Stored state does not match the state type: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Load/save contract of a persistence collaborator.
pub trait StateStore<S>: Send + Sync {
    /// Previously saved state, `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<S>, PersistError>;

    fn save(&self, state: &S) -> Result<(), PersistError>;
}

/// In-process keyed snapshot map, the equivalent of a saved-state handle.
///
/// Clones share the same map.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    key: String,
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_key(DEFAULT_STATE_KEY)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            values: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw JSON stored under this store's key.
    pub fn raw(&self) -> Option<Value> {
        self.values.lock().get(&self.key).cloned()
    }

    /// Replace the raw JSON under this store's key.
    pub fn put_raw(&self, value: Value) {
        self.values.lock().insert(self.key.clone(), value);
    }
}

impl<S> StateStore<S> for MemoryStore
where
    S: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Option<S>, PersistError> {
        self.raw()
            .map(|value| serde_json::from_value(value).map_err(PersistError::Decode))
            .transpose()
    }

    fn save(&self, state: &S) -> Result<(), PersistError> {
        let value = serde_json::to_value(state).map_err(PersistError::Encode)?;
        self.put_raw(value);
        Ok(())
    }
}

/// Snapshot kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<S> StateStore<S> for JsonFileStore
where
    S: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Option<S>, PersistError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(PersistError::Decode)
    }

    fn save(&self, state: &S) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(state).map_err(PersistError::Encode)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        // Write-then-rename so a reader never sees a truncated snapshot.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content).map_err(|e| self.io_error(e))?;
        fs::rename(&staging, &self.path).map_err(|e| self.io_error(e))
    }
}
