//! Persistent, observable keyed container.
//!
//! The mutating operations (`set`, `delete`) implement persist-and-notify
//! explicitly and the read operations pass through. Consumers and internal
//! callers go through the same methods, so every effective mutation hits
//! the backend uniformly by construction.

use crate::backend::{StorageBackend, StorageError};
use crate::codec::{self, CodecError};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Observable changes to a store, drained by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Contents changed and were re-persisted.
    Changed,
    /// The persisted value was malformed; the store reinitialized to empty
    /// and re-persisted. The reason is display/log text, not machine data.
    CorruptionRecovered { reason: String },
}

/// A keyed container whose every effective mutation is synchronously
/// durable. Entry order is insertion order and survives restore.
///
/// Keys are unique. A `set` whose value equals the stored one is a complete
/// no-op: no backend write, no event.
#[derive(Debug)]
pub struct PersistentStore<K, V> {
    storage_key: String,
    entries: Vec<(K, V)>,
    events: Vec<StoreEvent>,
}

impl<K, V> PersistentStore<K, V>
where
    K: PartialEq + Clone + Serialize + DeserializeOwned,
    V: PartialEq + Clone + Serialize + DeserializeOwned,
{
    /// Restore a store from the backend.
    ///
    /// No persisted value (or empty text) initializes the store to empty
    /// and eagerly persists that empty state, so later reads are
    /// well-defined. Malformed persisted text fails closed: the store
    /// records a [`StoreEvent::CorruptionRecovered`], reinitializes to
    /// empty, and re-persists. Parse failures never escape.
    pub fn open(
        backend: &mut dyn StorageBackend,
        storage_key: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let storage_key = storage_key.into();
        let mut events = Vec::new();

        let entries = match backend.read(&storage_key)? {
            Some(text) if !text.trim().is_empty() => match codec::decode_map::<K, V>(&text) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    events.push(StoreEvent::CorruptionRecovered {
                        reason: e.to_string(),
                    });
                    None
                }
            },
            _ => None,
        };

        let mut store = Self {
            storage_key,
            entries: entries.unwrap_or_default(),
            events,
        };
        if store.entries.is_empty() {
            store.persist(backend)?;
        }
        Ok(store)
    }

    /// The backend key this store persists under.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn has(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order. Finite and restartable.
    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Insert or replace. Returns `true` if contents changed.
    ///
    /// Setting a key to its current value is a no-op: nothing is persisted
    /// and no event fires.
    pub fn set(
        &mut self,
        backend: &mut dyn StorageBackend,
        key: K,
        value: V,
    ) -> Result<bool, StorageError> {
        if let Some(existing) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            if existing.1 == value {
                return Ok(false);
            }
            existing.1 = value;
        } else {
            self.entries.push((key, value));
        }
        self.persist(backend)?;
        self.events.push(StoreEvent::Changed);
        Ok(true)
    }

    /// Remove a key, returning the prior value. Removing an absent key is
    /// a no-op and returns `None`.
    pub fn delete(
        &mut self,
        backend: &mut dyn StorageBackend,
        key: &K,
    ) -> Result<Option<V>, StorageError> {
        let Some(pos) = self.entries.iter().position(|(k, _)| k == key) else {
            return Ok(None);
        };
        let (_, prior) = self.entries.remove(pos);
        self.persist(backend)?;
        self.events.push(StoreEvent::Changed);
        Ok(Some(prior))
    }

    /// Drain accumulated change events.
    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    fn persist(&self, backend: &mut dyn StorageBackend) -> Result<(), StorageError> {
        let text = codec::encode_map(&self.entries).map_err(encode_failure)?;
        backend.write(&self.storage_key, &text)
    }
}

/// An encode failure means a value type whose `Serialize` impl errors;
/// surfaced as a format error rather than a panic.
fn encode_failure(e: CodecError) -> StorageError {
    StorageError::Format(e.to_string())
}
