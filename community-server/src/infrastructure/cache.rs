//! Page cache for rendered responses.
//!
//! Entries expire after their TTL, when the cache is cleared, or when a full
//! cache needs room. Writes to posts do not touch the cache, so a cached page
//! may lag behind the store for up to one TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: &str, value: String, ttl: Duration);

    async fn delete(&self, key: &str);

    /// Drops every entry. Returns how many were removed.
    async fn clear(&self) -> usize;
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Entry cap of [`InMemoryPageCache::new`].
pub const DEFAULT_MAX_ENTRIES: usize = 300;

/// Process-wide map from key to rendered page, bounded in size.
///
/// When a new key arrives at capacity, expired entries are dropped first and
/// then the entries closest to expiry.
pub struct InMemoryPageCache {
    store: RwLock<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl Default for InMemoryPageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPageCache {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }
}

fn make_room(store: &mut HashMap<String, CacheEntry>, max_entries: usize) {
    let now = Instant::now();
    store.retain(|_, entry| entry.expires_at > now);

    while store.len() >= max_entries {
        let Some(key) = store
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(key, _)| key.clone())
        else {
            break;
        };
        store.remove(&key);
    }
}

#[async_trait]
impl PageCache for InMemoryPageCache {
    async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.read().await;
        let entry = store.get(key)?;

        if entry.is_expired() {
            drop(store);
            let mut store = self.store.write().await;
            // Another writer may have refreshed it in between.
            if store.get(key).is_some_and(CacheEntry::is_expired) {
                store.remove(key);
            }
            return None;
        }

        Some(entry.value.clone())
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut store = self.store.write().await;
        if !store.contains_key(key) && store.len() >= self.max_entries {
            make_room(&mut store, self.max_entries);
        }
        store.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    async fn delete(&self, key: &str) {
        self.store.write().await.remove(key);
    }

    async fn clear(&self) -> usize {
        let mut store = self.store.write().await;
        let removed = store.len();
        store.clear();
        removed
    }
}
