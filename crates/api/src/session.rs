use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifetime of a stored value, refreshed on every write.
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

/// Key-value storage for per-session state with expiry.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// `ttl` of `None` uses the store's default lifetime.
    fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>);

    fn delete(&self, key: &str);

    fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

pub struct InMemorySessionStore {
    entries: DashMap<String, Entry>,
    default_ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl: Duration::from_secs(config.ttl_secs),
        }
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                debug!(key, "session hit");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        debug!(key, "session miss");
        None
    }

    fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        debug!(key, ttl_secs = ttl.as_secs(), "session set");
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
        debug!(key, "session delete");
    }
}
