//! Cache-aside engine and public facade.
//!
//! Every method on [`Cache`] absorbs store failures and returns the
//! documented safe default (`None`, `false`, `0`, empty). A caching layer
//! that can fail a request is worse than no cache at all: request handlers
//! treat a default as "value unavailable" and fall back to the system of
//! record. Internally operations use [`CacheResult`] so tests can exercise
//! the error path directly through the store trait.

use crate::error::{CacheError, CacheResult};
use crate::store::{StoreBackend, StoreStats};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Public cache facade over a [`StoreBackend`].
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn StoreBackend>,
}

impl Cache {
    /// Create a facade over the given store.
    pub fn new(store: Arc<dyn StoreBackend>) -> Self {
        Self { store }
    }

    /// The underlying store, for components built on adapter primitives.
    #[must_use]
    pub fn store(&self) -> Arc<dyn StoreBackend> {
        Arc::clone(&self.store)
    }

    /// Best-effort availability hint for callers that want to skip caching
    /// entirely while the backend is down.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.store.is_available()
    }

    // ---- scalar operations, fail-soft ----

    /// Get a typed value, or `None` on miss, expiry, malformed payload, or
    /// store failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "cache get failed");
                None
            }
        }
    }

    /// Set a typed value. Returns whether the write succeeded.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        match self.try_set(key, value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "cache set failed");
                false
            }
        }
    }

    /// Delete the given keys, returning how many existed.
    pub async fn delete(&self, keys: &[String]) -> u64 {
        match self.store.delete(keys).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "cache delete failed");
                0
            }
        }
    }

    /// Delete one key, returning whether it existed.
    pub async fn delete_key(&self, key: &str) -> bool {
        let keys = [key.to_string()];
        self.delete(&keys).await > 0
    }

    /// Whether a key currently exists.
    pub async fn exists(&self, key: &str) -> bool {
        match self.store.exists(key).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(key, error = %e, "cache exists failed");
                false
            }
        }
    }

    /// Set an expiry on an existing key.
    pub async fn expire(&self, key: &str, ttl: Duration) -> bool {
        match self.store.expire(key, ttl).await {
            Ok(set) => set,
            Err(e) => {
                warn!(key, error = %e, "cache expire failed");
                false
            }
        }
    }

    /// Remaining time-to-live, or `None` when missing, persistent, or the
    /// store failed.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        match self.store.ttl(key).await {
            Ok(ttl) => ttl,
            Err(e) => {
                warn!(key, error = %e, "cache ttl failed");
                None
            }
        }
    }

    // ---- cache-aside ----

    /// Get a value, computing and caching it on miss.
    ///
    /// A hit returns the cached value without invoking `compute`. On miss,
    /// `compute` runs (typically an expensive read against the system of
    /// record) and its result is stored under `ttl` before being returned.
    /// A failed compute is logged and yields `None`.
    ///
    /// There is no single-flight lock: concurrent misses for the same key
    /// may each invoke `compute` and each write back. The last write wins
    /// and all writes carry the same TTL, so the duplicate work is bounded
    /// and no caller observes premature expiry.
    pub async fn get_or_set<T, F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = anyhow::Result<T>> + Send,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Some(cached);
        }

        match compute().await {
            Ok(value) => {
                // A failed write-back still returns the computed value.
                let _ = self.set(key, &value, Some(ttl)).await;
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "compute function failed on cache miss");
                None
            }
        }
    }

    /// Memoize an arbitrary computation under a derived key.
    ///
    /// Sugar over [`Cache::get_or_set`]; carries the same concurrency
    /// caveat.
    pub async fn memoize<T, K, F, Fut>(&self, key_fn: K, ttl: Duration, compute: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        K: FnOnce() -> String + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = anyhow::Result<T>> + Send,
    {
        let key = key_fn();
        self.get_or_set(&key, ttl, compute).await
    }

    // ---- ordered sets (leaderboards) ----

    /// Record a member's score on a leaderboard.
    pub async fn score_set(&self, key: &str, member: &str, score: f64) -> bool {
        match self.store.zset_add(key, member, score).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "leaderboard update failed");
                false
            }
        }
    }

    /// Top `count` members by descending score.
    pub async fn top(&self, key: &str, count: usize) -> Vec<String> {
        if count == 0 {
            return Vec::new();
        }
        match self.store.zset_rev_range(key, 0, count as isize - 1).await {
            Ok(members) => members,
            Err(e) => {
                warn!(key, error = %e, "leaderboard read failed");
                Vec::new()
            }
        }
    }

    /// A member's ascending rank, or `None` if absent or the store failed.
    pub async fn rank(&self, key: &str, member: &str) -> Option<u64> {
        match self.store.zset_rank(key, member).await {
            Ok(rank) => rank,
            Err(e) => {
                warn!(key, error = %e, "leaderboard rank failed");
                None
            }
        }
    }

    /// A member's score, or `None` if absent or the store failed.
    pub async fn score(&self, key: &str, member: &str) -> Option<f64> {
        match self.store.zset_score(key, member).await {
            Ok(score) => score,
            Err(e) => {
                warn!(key, error = %e, "leaderboard score failed");
                None
            }
        }
    }

    // ---- administration ----

    /// Drop every key. Destructive; intended for test and ops use only.
    pub async fn flush_all(&self) -> bool {
        match self.store.flush_all().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "cache flush failed");
                false
            }
        }
    }

    /// Store statistics, or `None` when the backend is unreachable.
    pub async fn stats(&self) -> Option<StoreStats> {
        match self.store.stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "cache stats failed");
                None
            }
        }
    }

    // ---- internal typed operations ----

    async fn try_get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.store.get(key).await? {
            Some(json) => {
                let value = serde_json::from_str(&json).map_err(CacheError::Serialization)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn try_set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json, ttl).await
    }
}
