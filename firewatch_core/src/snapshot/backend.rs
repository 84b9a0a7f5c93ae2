// firewatch_core/src/snapshot/backend.rs

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{DeviceTag, SnapshotRecord};
use crate::error::StorageError;

const DEVICE_FILE: &str = "device-tag";

/// A persistence medium holding one record per storage key.
///
/// `replace` swaps the whole record; readers never see a partial one.
pub trait SnapshotBackend: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<SnapshotRecord>, StorageError>;

    fn replace(&mut self, key: &str, record: SnapshotRecord) -> Result<(), StorageError>;
}

/// Process-local storage. Clones share the same slots, which stands in for
/// a browser's storage surviving a page reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slots: Arc<RwLock<HashMap<String, SnapshotRecord>>>,
}

impl MemoryBackend {
    pub fn slot_count(&self) -> usize {
        self.slots.read().len()
    }

    pub fn record(&self, key: &str) -> Option<SnapshotRecord> {
        self.slots.read().get(key).cloned()
    }

    /// Writes a raw record, e.g. to simulate another tab or a corrupted slot.
    pub fn insert_raw(&self, key: &str, record: SnapshotRecord) {
        self.slots.write().insert(key.to_string(), record);
    }
}

impl SnapshotBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<SnapshotRecord>, StorageError> {
        Ok(self.slots.read().get(key).cloned())
    }

    fn replace(&mut self, key: &str, record: SnapshotRecord) -> Result<(), StorageError> {
        self.slots.write().insert(key.to_string(), record);
        Ok(())
    }
}

/// One TOML file per storage key under a state directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`; anything outside `[A-Za-z0-9._-]`
    /// becomes `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_name}.toml"))
    }

    /// The tag of this install, created on first use.
    /// Creates the state directory if it is missing.
    pub fn create_root(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn load_or_create_device_tag(&self) -> Result<DeviceTag, StorageError> {
        let path = self.root.join(DEVICE_FILE);
        if path.exists() {
            let tag = fs::read_to_string(&path)?.trim().to_string();
            if !tag.is_empty() {
                return Ok(DeviceTag::new(tag));
            }
        }

        let tag = DeviceTag::generate();
        self.create_root()?;
        write_atomically(&path, tag.as_str())?;
        tracing::info!(path = ?path, device = %tag, "generated device tag");
        Ok(tag)
    }
}

impl SnapshotBackend for FileBackend {
    fn load(&self, key: &str) -> Result<Option<SnapshotRecord>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        let entries: BTreeMap<String, toml::Value> = toml::from_str(&contents)?;
        Ok(Some(SnapshotRecord(entries)))
    }

    fn replace(&mut self, key: &str, record: SnapshotRecord) -> Result<(), StorageError> {
        let contents = toml::to_string(&record.0)?;
        fs::create_dir_all(&self.root)?;
        write_atomically(&self.path_for(key), &contents)
    }
}

// Atomic write: write to temp file, then rename
fn write_atomically(path: &Path, contents: &str) -> Result<(), StorageError> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, contents)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
