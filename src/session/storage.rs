use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::error::Error;

/// Durable string key-value storage, scoped to one API origin.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), Error>;
    fn remove_item(&self, key: &str) -> Result<(), Error>;
}

/// Volatile storage; nothing survives the process
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        let items = self
            .items
            .lock()
            .map_err(|_| Error::Storage("Session storage lock poisoned".to_string()))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| Error::Storage("Session storage lock poisoned".to_string()))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), Error> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| Error::Storage("Session storage lock poisoned".to_string()))?;
        items.remove(key);
        Ok(())
    }
}

/// Storage persisted as one JSON object per origin (`<dir>/<origin>.json`)
pub struct FileStorage {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStorage {
    /// Open (or lazily create) the session file for `origin` inside `dir`
    pub fn new(dir: &Path, origin: &str) -> Result<Self, Error> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                Error::Storage(format!("Failed to create storage directory: {}", e))
            })?;
        }

        Ok(Self {
            path: dir.join(format!("{}.json", file_stem(origin))),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, Error> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| Error::Storage(format!("Failed to read session file: {}", e)))?;

        match serde_json::from_str(&content) {
            Ok(items) => Ok(items),
            Err(e) => {
                // an unreadable file is treated like an empty one; the next write replaces it
                warn!("Ignoring corrupt session file {}: {}", self.path.display(), e);
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), Error> {
        if items.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path)
                    .map_err(|e| Error::Storage(format!("Failed to delete session file: {}", e)))?;
            }
            return Ok(());
        }

        let json = serde_json::to_string_pretty(items)
            .map_err(|e| Error::Storage(format!("Failed to serialize session: {}", e)))?;
        fs::write(&self.path, json)
            .map_err(|e| Error::Storage(format!("Failed to write session file: {}", e)))?;
        Ok(())
    }

    fn modify<F>(&self, change: F) -> Result<(), Error>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Storage("Session storage lock poisoned".to_string()))?;
        let mut items = self.read_all()?;
        change(&mut items);
        self.write_all(&items)
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Storage("Session storage lock poisoned".to_string()))?;
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        self.modify(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), Error> {
        self.modify(|items| {
            items.remove(key);
        })
    }
}

/// `http://127.0.0.1:8000` -> `http_127.0.0.1_8000`
fn file_stem(origin: &str) -> String {
    let stem: String = origin
        .replace("://", "_")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "default".to_string()
    } else {
        stem
    }
}
