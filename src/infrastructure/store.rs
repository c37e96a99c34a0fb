//! Key-value store implementations
//!
//! `FileKeyValueStore` keeps one `<key>.json` file per key in a data directory.
//! `MemoryKeyValueStore` keeps values in a map and is used by tests.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument};

use crate::infrastructure::traits::{FileSystem, KeyValueStore};

/// Keys become file names, so they must be a single plain path segment.
fn validate_key(key: &str) -> io::Result<()> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\'])
        || key.chars().any(char::is_control);
    if invalid {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid storage key: {key:?}"),
        ));
    }
    Ok(())
}

/// File-backed store: each key maps to `<dir>/<key>.json`.
pub struct FileKeyValueStore {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(fs: Arc<dyn FileSystem>, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
        }
    }

    /// File holding the value for `key`.
    pub fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileKeyValueStore {
    #[instrument(level = "debug", skip(self))]
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.path_for(key)?;
        if !self.fs.exists(&path) {
            debug!("get: no value at {}", path.display());
            return Ok(None);
        }
        self.fs.read_to_string(&path).map(Some)
    }

    #[instrument(level = "debug", skip(self, value), fields(bytes = value.len()))]
    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let path = self.path_for(key)?;
        self.fs.create_dir_all(&self.dir)?;
        self.fs.write_atomic(&path, value)
    }

    #[instrument(level = "debug", skip(self))]
    fn remove(&self, key: &str) -> io::Result<()> {
        let path = self.path_for(key)?;
        if self.fs.exists(&path) {
            self.fs.remove_file(&path)?;
        }
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        validate_key(key)?;
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        validate_key(key)?;
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        validate_key(key)?;
        self.lock()?.remove(key);
        Ok(())
    }
}
