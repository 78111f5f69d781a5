//! Client-side keyed query cache.
//!
//! Query results are stored under their request path (e.g. `/api/leads`).
//! Invalidating a key marks its entry stale so the next [`QueryCache::fetch`]
//! goes back to the server, and tells every subscriber which key changed.
//! The cache is an ordinary value owned by whoever drives the flows; clones
//! share the same entries.

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(String),
    Invalidated(String),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    stale: bool,
}

#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    events: broadcast::Sender<CacheEvent>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// The cached value, fresh or stale.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key).map(|e| e.value.clone())
    }

    pub fn is_stale(&self, key: &str) -> bool {
        self.read().get(key).map_or(true, |e| e.stale)
    }

    pub fn set(&self, key: &str, value: Value) {
        self.write().insert(
            key.to_string(),
            Entry {
                value,
                stale: false,
            },
        );
        let _ = self.events.send(CacheEvent::Updated(key.to_string()));
    }

    /// Marks `key` stale and notifies subscribers. Returns whether an entry
    /// existed; subscribers are notified either way so that views which
    /// have not loaded yet still learn the data changed.
    pub fn invalidate(&self, key: &str) -> bool {
        let existed = match self.write().get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        };
        debug!(key, existed, "invalidated query");
        let _ = self.events.send(CacheEvent::Invalidated(key.to_string()));
        existed
    }

    /// Serves a fresh entry or runs `load` and stores its result.
    pub async fn fetch<F, Fut, E>(&self, key: &str, load: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        let cached = self
            .read()
            .get(key)
            .filter(|e| !e.stale)
            .map(|e| e.value.clone());
        if let Some(value) = cached {
            return Ok(value);
        }
        let value = load().await?;
        self.set(key, value.clone());
        Ok(value)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
