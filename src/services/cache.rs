// src/services/cache.rs

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

/// Key-value cache of materialized result pages.
///
/// Values are opaque JSON blobs: a `set`/`get` round trip returns an
/// equivalent value until the entry's TTL elapses or `clear` wipes the
/// whole cache. Mutating code paths call `clear` rather than trying to
/// enumerate affected keys.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value, ttl: Duration);
    /// Unconditional full wipe.
    async fn clear(&self);
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// Process-local cache backed by a HashMap with per-entry expiry.
///
/// Expired entries are dropped lazily: `get` refuses to serve them and
/// `set` prunes them, so the map stays bounded by the working set.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.value.clone())
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
