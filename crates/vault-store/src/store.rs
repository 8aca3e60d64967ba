//! # Key-Value Store
//!
//! Whole-collection persistence under fixed logical keys. Values are JSON
//! documents; typing happens one layer up in [`Vault`](crate::Vault).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use vault_vc::BundleError;

/// The fixed logical keys the vault persists under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    /// `Credential[]`.
    Credentials,
    /// `Bundle[]`.
    Bundles,
    /// `RevocationEntry[]`.
    RevocationList,
    /// The unlocked actor identifier.
    DigitalId,
}

impl CollectionKey {
    /// All keys.
    pub const ALL: [CollectionKey; 4] = [
        Self::Credentials,
        Self::Bundles,
        Self::RevocationList,
        Self::DigitalId,
    ];

    /// The storage key string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credentials => "credentials",
            Self::Bundles => "bundles",
            Self::RevocationList => "revocationList",
            Self::DigitalId => "digitalId",
        }
    }
}

impl std::fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the store and the holder vault.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("io error at {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A stored collection is not valid JSON of the expected shape.
    #[error("collection `{key}` is corrupt: {source}")]
    Corrupt {
        /// The collection key.
        key: CollectionKey,
        /// The underlying error.
        source: serde_json::Error,
    },

    /// A value could not be serialized for storage.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The operation needs an unlocked identity.
    #[error("vault is locked; unlock with an actor id first")]
    Locked,

    /// A bundle could not be assembled.
    #[error(transparent)]
    Bundle(#[from] BundleError),
}

/// Whole-collection get/set.
pub trait KeyValueStore {
    /// Read a collection. `None` if it was never written or was removed.
    fn get(&self, key: CollectionKey) -> Result<Option<Value>, StoreError>;

    /// Replace a collection.
    fn set(&self, key: CollectionKey, value: &Value) -> Result<(), StoreError>;

    /// Delete a collection. Removing an absent key is not an error.
    fn remove(&self, key: CollectionKey) -> Result<(), StoreError>;
}

/// Volatile store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<CollectionKey, Value>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: CollectionKey) -> Result<Option<Value>, StoreError> {
        Ok(self.values.lock().get(&key).cloned())
    }

    fn set(&self, key: CollectionKey, value: &Value) -> Result<(), StoreError> {
        self.values.lock().insert(key, value.clone());
        Ok(())
    }

    fn remove(&self, key: CollectionKey) -> Result<(), StoreError> {
        self.values.lock().remove(&key);
        Ok(())
    }
}

/// One pretty-printed JSON file per collection, in a directory.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so a crash mid-write leaves the previous collection intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// A store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file backing a collection.
    pub fn path_for(&self, key: CollectionKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: CollectionKey) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&path)(e)),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { key, source })
    }

    fn set(&self, key: CollectionKey, value: &Value) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key.as_str()));
        let text = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, text).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_err(&path))?;
        tracing::debug!(%key, path = %path.display(), "collection written");
        Ok(())
    }

    fn remove(&self, key: CollectionKey) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&path)(e)),
        }
    }
}
