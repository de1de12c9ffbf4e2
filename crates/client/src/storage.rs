//! Durable local storage for the session record.
//!
//! The auth store is the only writer; the HTTP adapter reads the bearer
//! token from here on every request. Values are plain strings under the keys
//! in [`keys`], so the storage itself knows nothing about the session shape.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::StorageError;

/// Storage keys for session data.
pub mod keys {
    /// Key for the JSON-encoded user record.
    pub const USER: &str = "user";

    /// Key for the bearer token.
    pub const TOKEN: &str = "token";
}

/// String key-value storage that survives process restarts.
pub trait SessionStorage: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage, used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}

/// JSON file storage: one object mapping keys to string values.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash never leaves a half-written session behind.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Storage backed by `path`. The file and its parent directory are
    /// created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(values)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = values.len(), "Session storage written");
        Ok(())
    }

    fn modify(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut values = self.load()?;
        f(&mut values);
        self.save(&values)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|values| {
            values.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.modify(|values| {
            values.remove(key);
        })
    }
}
