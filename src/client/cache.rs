//! TTL-aware LRU cache for GraphQL responses.
//!
//! Each client owns its own cache instance so tests and concurrent
//! pipelines never observe each other's entries. Values are stored as raw
//! `serde_json::Value` payloads keyed by endpoint, query text, and the
//! serialized variables, so two requests differing only in variables never
//! collide.

use crate::constants::RESPONSE_CACHE_CAPACITY;
use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

struct CachedResponse {
    data: Value,
    cached_at: Instant,
    ttl: Duration,
}

impl CachedResponse {
    fn is_expired(&self) -> bool {
        self.cached_at.elapsed() >= self.ttl
    }
}

/// Shared response cache with per-entry TTL.
pub struct ResponseCache {
    entries: RwLock<LruCache<String, CachedResponse>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_capacity(RESPONSE_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Builds the canonical cache key for a request.
    pub fn key(endpoint: &str, query: &str, variables: &Value) -> String {
        format!("{endpoint}:{query}:{variables}")
    }

    /// Returns the cached payload if present and not expired.
    ///
    /// Takes the write lock because both the LRU bump and expired-entry
    /// eviction mutate the map.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.data.clone()),
            Some(_) => {
                debug!("Evicting expired cache entry");
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: String, data: Value, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.put(
            key,
            CachedResponse {
                data,
                cached_at: Instant::now(),
                ttl,
            },
        );
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_cache_hit_within_ttl() {
        let cache = ResponseCache::new();
        let key = ResponseCache::key("central", "query A { a }", &json!({"id": "1"}));
        cache
            .insert(key.clone(), json!({"a": 1}), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get(&key).await, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_cache_miss_after_expiry() {
        let cache = ResponseCache::new();
        let key = "k".to_string();
        cache
            .insert(key.clone(), json!(true), Duration::from_millis(0))
            .await;
        assert_eq!(cache.get(&key).await, None);
        // Expired entry is dropped, not merely skipped.
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_distinct_variables_do_not_collide() {
        let cache = ResponseCache::new();
        let query = "query T { t }";
        let key_a = ResponseCache::key("central", query, &json!({"id": "1"}));
        let key_b = ResponseCache::key("central", query, &json!({"id": "2"}));
        assert_ne!(key_a, key_b);
        cache
            .insert(key_a.clone(), json!("a"), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get(&key_b).await, None);
    }

    #[tokio::test]
    async fn test_lru_eviction_at_capacity() {
        let cache = ResponseCache::with_capacity(2);
        for i in 0..3 {
            cache
                .insert(format!("k{i}"), json!(i), Duration::from_secs(60))
                .await;
        }
        assert_eq!(cache.get("k0").await, None);
        assert_eq!(cache.get("k2").await, Some(json!(2)));
    }
}
