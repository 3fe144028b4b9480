//! Singleton persisted scalar.
//!
//! The energy balance and the successful-build counter are single values,
//! not keyed collections, so they persist as plain JSON under their own
//! backend key instead of going through the tagged-map codec.

use crate::backend::{StorageBackend, StorageError};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Observable changes to a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellEvent {
    /// The value changed and was re-persisted.
    Changed,
    /// The persisted value was malformed; the cell reset to its default
    /// and re-persisted.
    CorruptionRecovered { reason: String },
}

/// A persisted scalar with lazy default initialization.
#[derive(Debug)]
pub struct PersistentCell<T> {
    storage_key: String,
    value: T,
    events: Vec<CellEvent>,
}

impl<T> PersistentCell<T>
where
    T: PartialEq + Clone + Serialize + DeserializeOwned,
{
    /// Restore the cell, or initialize it to `default` and persist that
    /// before returning (one-time lazy initialization). Malformed persisted
    /// text self-heals to `default` and records the recovery.
    pub fn open_or(
        backend: &mut dyn StorageBackend,
        storage_key: impl Into<String>,
        default: T,
    ) -> Result<Self, StorageError> {
        let storage_key = storage_key.into();
        let mut events = Vec::new();

        let restored = match backend.read(&storage_key)? {
            Some(text) if !text.trim().is_empty() => match serde_json::from_str::<T>(&text) {
                Ok(value) => Some(value),
                Err(e) => {
                    events.push(CellEvent::CorruptionRecovered {
                        reason: e.to_string(),
                    });
                    None
                }
            },
            _ => None,
        };

        match restored {
            Some(value) => Ok(Self {
                storage_key,
                value,
                events,
            }),
            None => {
                let cell = Self {
                    storage_key,
                    value: default,
                    events,
                };
                cell.persist(backend)?;
                Ok(cell)
            }
        }
    }

    /// The backend key this cell persists under.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace the value. Always persists and records [`CellEvent::Changed`],
    /// even when the new value equals the old one.
    pub fn set(&mut self, backend: &mut dyn StorageBackend, value: T) -> Result<(), StorageError> {
        self.value = value;
        self.persist(backend)?;
        self.events.push(CellEvent::Changed);
        Ok(())
    }

    /// Like [`set`](Self::set), but a write of the current value is a
    /// complete no-op. Returns `true` if the value changed.
    pub fn set_if_changed(
        &mut self,
        backend: &mut dyn StorageBackend,
        value: T,
    ) -> Result<bool, StorageError> {
        if self.value == value {
            return Ok(false);
        }
        self.set(backend, value)?;
        Ok(true)
    }

    /// Read-modify-write.
    pub fn update(
        &mut self,
        backend: &mut dyn StorageBackend,
        f: impl FnOnce(&T) -> T,
    ) -> Result<(), StorageError> {
        let next = f(&self.value);
        self.set(backend, next)
    }

    /// Drain accumulated change events.
    pub fn drain_events(&mut self) -> Vec<CellEvent> {
        std::mem::take(&mut self.events)
    }

    fn persist(&self, backend: &mut dyn StorageBackend) -> Result<(), StorageError> {
        let text = serde_json::to_string(&self.value)
            .map_err(|e| StorageError::Format(e.to_string()))?;
        backend.write(&self.storage_key, &text)
    }
}
