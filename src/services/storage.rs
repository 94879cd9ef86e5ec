use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

pub const KEY_AUTH_TOKEN: &str = "auth_token";
pub const KEY_SELECTED_GURU: &str = "selected_guru";
pub const KEY_CURRENT_CHAT: &str = "current_chat_id";
pub const KEY_FIRST_TIME_USER: &str = "first_time_user";

/// Durable key-value store backed by one JSON file per key under the app
/// data directory. This is a resume cache, never the source of truth: the
/// containers reconcile everything read from here against the server.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Store rooted at the platform data dir (`.../UniGuru`).
    pub fn open_default() -> Result<Self, StoreError> {
        let root = dirs::data_dir().ok_or(StoreError::NoDataDir)?.join("UniGuru");
        Self::open(root)
    }

    /// Store rooted at an explicit directory. Used by tests and embedders
    /// with their own layout.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Best-effort read: a missing, unreadable, or corrupt value degrades to
    /// `None`.
    pub fn get_or_default<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(key, error = %err, "discarding unreadable stored value");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(value)?;
        fs::write(self.key_path(key), content)?;
        Ok(())
    }

    /// Best-effort write; a failure is logged and dropped.
    pub fn set_quiet<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(err) = self.set(key, value) {
            tracing::warn!(key, error = %err, "failed to persist value");
        }
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Best-effort removal; a failure is logged and dropped.
    pub fn remove_quiet(&self, key: &str) {
        if let Err(err) = self.remove(key) {
            tracing::warn!(key, error = %err, "failed to remove stored value");
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.key_path(key).exists()
    }
}
