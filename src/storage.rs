use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::errors::StorefrontError;

/// Fixed keys the storefront persists between sessions. Values are opaque
/// string blobs with no schema versioning.
pub mod keys {
    pub const CART: &str = "cart";
    pub const CURRENT_ORDER: &str = "currentOrder";
    pub const TOKEN: &str = "token";
    pub const USER: &str = "user";
    pub const DELIVERY_POSTCODE: &str = "deliveryPostcode";
}

/// Local-storage analog: a small synchronous key/value blob store.
///
/// Implementations must be cheap enough to call on every cart mutation.
pub trait SnapshotStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorefrontError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorefrontError>;
    fn remove(&self, key: &str) -> Result<(), StorefrontError>;
}

/// JSON helpers layered over the raw blob interface.
pub trait SnapshotStorageExt: SnapshotStorage {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorefrontError> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorefrontError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

impl<S: SnapshotStorage + ?Sized> SnapshotStorageExt for S {}

/// One file per key under a dedicated directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorefrontError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| StorefrontError::StorageError(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are fixed identifiers, but stay defensive about separators.
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl SnapshotStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorefrontError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorefrontError::StorageError(format!(
                "read {}: {e}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorefrontError> {
        let path = self.path_for(key);
        write_atomically(&path, value)
            .map_err(|e| StorefrontError::StorageError(format!("write {}: {e}", path.display())))
    }

    fn remove(&self, key: &str) -> Result<(), StorefrontError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorefrontError::StorageError(format!(
                "remove {}: {e}",
                path.display()
            ))),
        }
    }
}

fn write_atomically(path: &Path, value: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, value)?;
    fs::rename(&tmp, path)
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorefrontError> {
        Ok(self
            .entries
            .read()
            .expect("storage lock poisoned")
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorefrontError> {
        debug!(key, "storing snapshot");
        self.entries
            .write()
            .expect("storage lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorefrontError> {
        self.entries
            .write()
            .expect("storage lock poisoned")
            .remove(key);
        Ok(())
    }
}
