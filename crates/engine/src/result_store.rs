//! Where finished recommendation lists are written.
//!
//! The engine only writes: a list is stored under the user's key with an
//! expiry, and whoever serves recommendations reads it back from there.

use data_loader::UserId;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default lifetime of a stored list
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to serialize recommendations: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Result store unavailable: {0}")]
    Unavailable(String),
}

/// Key of a user's recommendation list
pub fn user_key(user_id: UserId) -> String {
    format!("recs:user:{}", user_id)
}

/// Key/value store with per-entry expiry
pub trait ResultStore: Send + Sync {
    fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Stored value, if present and not expired
    fn get(&self, key: &str) -> Option<String>;
}

/// Process-local store, used by the CLI and tests
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    entries: Mutex<HashMap<String, (Instant, String)>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|(expires, _)| *expires > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultStore for InMemoryResultStore {
    fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), (Instant::now() + ttl, value));
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((expires, value)) if *expires > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}
