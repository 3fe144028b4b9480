//! The external persistent key/value substrate.
//!
//! Keys and values are both strings; values are JSON text written by the
//! stores in this crate. Two implementations ship: [`MemoryBackend`] for
//! tests and headless use, and [`FileBackend`] for a single-file save.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed save file: {0}")]
    Format(String),
}

/// A persistent string-keyed, string-valued substrate.
///
/// Writes must be durable before the call returns; callers rely on this to
/// make the persisted state the source of truth across process instances.
/// No cross-instance transaction is offered: two processes sharing one
/// backend are last-writer-wins.
pub trait StorageBackend {
    /// Read the value stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Durably store `value` under `key`, replacing any prior value.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`, returning the prior value if one existed.
    fn remove(&mut self, key: &str) -> Result<Option<String>, StorageError>;
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// In-process backend over a `BTreeMap`. Counts writes and removes so tests
/// can assert that no-op mutations really perform no persistence traffic.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
    writes: u64,
    removes: u64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a key, bypassing the write counter. For test setup.
    pub fn seed(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    /// Number of `write` calls since construction.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Number of `remove` calls since construction.
    pub fn remove_count(&self) -> u64 {
        self.removes
    }

    /// All stored keys, in lexical order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes += 1;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        self.removes += 1;
        Ok(self.entries.remove(key))
    }
}

// ---------------------------------------------------------------------------
// FileBackend
// ---------------------------------------------------------------------------

/// Single-file save backend. The whole key/value map is one JSON object on
/// disk; every mutation rewrites the file through a temp-file rename so a
/// crash mid-write cannot leave a torn save.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileBackend {
    /// Open a save file, creating an empty one if it does not exist.
    /// A file that is not a JSON string-to-string object fails with
    /// [`StorageError::Format`]; per-value corruption is handled by the
    /// stores, not here.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str::<BTreeMap<String, String>>(&text)
                .map_err(|e| StorageError::Format(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    /// The save file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StorageError::Format(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        let prior = self.entries.remove(key);
        if prior.is_some() {
            self.flush()?;
        }
        Ok(prior)
    }
}
