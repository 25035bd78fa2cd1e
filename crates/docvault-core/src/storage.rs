//! Key→record persistence.
//!
//! The core only needs `get`/`put` with last-write-wins semantics and no
//! multi-key transactions, so every envelope update must succeed in
//! isolation. `MemoryStore` backs tests and embedding hosts;
//! `JsonFileStore` keeps one JSON file per key under a data directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{Result, VaultError};

pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn put(&self, key: &str, value: Value) -> Result<()>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Value) -> Result<()> {
        (**self).put(key, value)
    }
}

/// In-memory store. Interior mutability so handles can share a reference.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Value) -> Result<()> {
        self.records.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// One pretty-printed JSON file per key.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    /// Open the store in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let dirs = ProjectDirs::from("net", "docvault", "DocVault").ok_or_else(|| {
            VaultError::Storage("failed to determine data directory".to_string())
        })?;
        Self::open(dirs.data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.file_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)?;
        let value = serde_json::from_str(&data)
            .map_err(|e| VaultError::Format(format!("record {key}: {e}")))?;
        Ok(Some(value))
    }

    fn put(&self, key: &str, value: Value) -> Result<()> {
        let data = serde_json::to_string_pretty(&value)
            .map_err(|e| VaultError::Storage(format!("record {key}: {e}")))?;
        fs::write(self.file_for(key), data)?;
        Ok(())
    }
}
