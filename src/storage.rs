//! Key-value string storage, the terminal counterpart of browser `localStorage`.
//!
//! DESIGN
//! ======
//! Every value is an opaque string stored under a short key. Writes replace
//! the whole value; there is no partial update and no versioning. Last write
//! wins. `FileStorage` keeps one `<key>.json` file per key in a directory and
//! is meant for a single process; two processes sharing a directory will
//! clobber each other.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const VALUE_EXTENSION: &str = "json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("storage io failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

/// Minimal `localStorage`-shaped interface.
pub trait Storage {
    /// Read the value stored under `key`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error when the key is invalid or the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the key is invalid or the write fails.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the key is invalid or the removal fails.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be listed.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns the first removal failure.
    fn clear(&mut self) -> Result<(), StorageError> {
        for key in self.keys()? {
            self.remove_item(&key)?;
        }
        Ok(())
    }
}

/// Keys end up as file names, so keep them to a conservative alphabet.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid { Ok(()) } else { Err(StorageError::InvalidKey(key.to_owned())) }
}

// =============================================================================
// MEMORY
// =============================================================================

/// Process-local storage. Used by tests and by `--ephemeral` sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items.keys().cloned().collect())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// Directory-backed storage: `<root>/<key>.json` per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|source| StorageError::Io { key: root.display().to_string(), source })?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{VALUE_EXTENSION}"))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { key: key.to_owned(), source }),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let path = self.path_for(key);
        // Write beside the target, then rename over it.
        let staging = self.root.join(format!(".{key}.tmp"));
        fs::write(&staging, value)
            .and_then(|()| fs::rename(&staging, &path))
            .map_err(|source| StorageError::Io { key: key.to_owned(), source })
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { key: key.to_owned(), source }),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = fs::read_dir(&self.root)
            .map_err(|source| StorageError::Io { key: self.root.display().to_string(), source })?;
        let mut keys = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != VALUE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_key(stem).is_ok() {
                keys.push(stem.to_owned());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
