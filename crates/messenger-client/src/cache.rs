//! Bounded cache of GET responses, persisted in local storage.
//!
//! Eviction is by insertion order: when the cache is full, adding a new key
//! drops the key that was inserted first. Reads do not refresh an entry's
//! position and overwriting a key keeps it in place.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::storage::{LocalStorage, StorageError};

pub const CACHE_KEY: &str = "apiCache";
pub const MAX_CACHE_SIZE: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    key: String,
    value: Value,
}

pub struct ResponseCache {
    storage: Arc<dyn LocalStorage>,
    capacity: usize,
    /// Serializes read-modify-write cycles on the stored entry list.
    write_lock: Mutex<()>,
}

impl ResponseCache {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self::with_capacity(storage, MAX_CACHE_SIZE)
    }

    pub fn with_capacity(storage: Arc<dyn LocalStorage>, capacity: usize) -> Self {
        Self {
            storage,
            capacity: capacity.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.load()
            .into_iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value)
    }

    pub fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.load();

        if let Some(existing) = entries.iter_mut().find(|entry| entry.key == key) {
            existing.value = value;
        } else {
            if entries.len() >= self.capacity {
                let excess = entries.len() + 1 - self.capacity;
                entries.drain(..excess);
            }
            entries.push(CacheEntry {
                key: key.to_string(),
                value,
            });
        }

        self.save(&entries)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;
        self.storage.remove_item(CACHE_KEY)
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys from oldest to newest insertion.
    pub fn keys(&self) -> Vec<String> {
        self.load().into_iter().map(|entry| entry.key).collect()
    }

    fn load(&self) -> Vec<CacheEntry> {
        let Some(raw) = self.storage.get_item(CACHE_KEY) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Discarding unreadable response cache: {}", e);
            Vec::new()
        })
    }

    fn save(&self, entries: &[CacheEntry]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entries)?;
        self.storage.set_item(CACHE_KEY, &raw)
    }
}
