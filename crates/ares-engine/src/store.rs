//! Best-effort snapshot storage.
//!
//! The combat roster survives restarts as a text blob written on shutdown
//! and read on the next start. Storage is keyed by a short name.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

/// Load, save, and erase named text blobs.
pub trait SnapshotStore {
    /// Read a blob; `Ok(None)` when it was never written.
    fn load(&self, key: &str) -> io::Result<Option<String>>;

    /// Write a blob, replacing any previous one.
    fn save(&mut self, key: &str, blob: &str) -> io::Result<()>;

    /// Remove a blob. Removing a missing blob is not an error.
    fn erase(&mut self, key: &str) -> io::Result<()>;
}

/// Stores each blob as `.<key>.ares` inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store blobs under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The file a key maps to.
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{key}.ares"))
    }
}

impl SnapshotStore for FileStore {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&mut self, key: &str, blob: &str) -> io::Result<()> {
        std::fs::write(self.path(key), blob)
    }

    fn erase(&mut self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Keeps blobs in memory; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one blob.
    pub fn with_blob(key: impl Into<String>, blob: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.blobs.insert(key.into(), blob.into());
        store
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn save(&mut self, key: &str, blob: &str) -> io::Result<()> {
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn erase(&mut self, key: &str) -> io::Result<()> {
        self.blobs.remove(key);
        Ok(())
    }
}
