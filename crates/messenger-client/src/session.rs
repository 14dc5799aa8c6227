use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::{LocalStorage, StorageError};

pub const SESSION_KEY: &str = "userSession";

/// The signed-in user. Its presence in storage is the whole authentication
/// state; there is no expiry and the server never validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username_hash: String,
}

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn LocalStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    pub fn set(&self, session: &Session) -> Result<(), StorageError> {
        let raw = serde_json::to_string(session)?;
        self.storage.set_item(SESSION_KEY, &raw)
    }

    pub fn get(&self) -> Option<Session> {
        let raw = self.storage.get_item(SESSION_KEY)?;
        serde_json::from_str(&raw)
            .map_err(|e| warn!("Unreadable session entry: {}", e))
            .ok()
    }

    /// True for any stored, non-null session entry.
    pub fn has(&self) -> bool {
        self.storage
            .get_item(SESSION_KEY)
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
            .is_some_and(|v| !v.is_null())
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_item(SESSION_KEY)
    }
}
