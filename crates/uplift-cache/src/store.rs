//! Store adapter trait for the backing key-value engine.

use crate::error::CacheResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Point-in-time statistics reported by the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of keys in the selected database.
    pub entry_count: u64,
    /// Bytes of memory in use.
    pub memory_used: u64,
    /// Connected client count.
    pub connected_clients: u64,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}

/// Abstraction over the backing key-value engine's primitive operations.
///
/// The trait isolates everything above it from the wire protocol and allows
/// test doubles to stand in for the real store. Implementations report
/// failures as errors; converting those into safe defaults is the job of
/// the public facade, not of the adapter.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    // ---- scalar ----

    /// Get the raw value at `key`, or `None` if missing or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set `key` to `value`, with an expiry when `ttl` is given.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()>;

    /// Delete the given keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> CacheResult<u64>;

    /// Whether `key` currently exists.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Set an expiry on an existing key. Returns false if the key is missing.
    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool>;

    /// Remaining time-to-live, or `None` when the key is missing or has no
    /// expiry.
    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>>;

    /// Atomically increment the integer at `key` by `delta`, creating it at
    /// zero first when missing. Returns the post-increment value.
    async fn incr(&self, key: &str, delta: i64) -> CacheResult<i64>;

    // ---- hashes ----

    /// Get one hash field.
    async fn hash_get(&self, key: &str, field: &str) -> CacheResult<Option<String>>;

    /// Set one hash field.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()>;

    /// Get all fields of a hash.
    async fn hash_get_all(&self, key: &str) -> CacheResult<Vec<(String, String)>>;

    /// Delete one hash field, returning whether it existed.
    async fn hash_delete(&self, key: &str, field: &str) -> CacheResult<bool>;

    // ---- lists ----

    /// Push to the head of a list, returning the new length.
    async fn list_push_left(&self, key: &str, value: &str) -> CacheResult<u64>;

    /// Push to the tail of a list, returning the new length.
    async fn list_push_right(&self, key: &str, value: &str) -> CacheResult<u64>;

    /// Inclusive range of list elements.
    async fn list_range(&self, key: &str, start: isize, stop: isize) -> CacheResult<Vec<String>>;

    /// Trim a list to the inclusive range.
    async fn list_trim(&self, key: &str, start: isize, stop: isize) -> CacheResult<()>;

    // ---- sorted sets ----

    /// Add a member with a score, updating the score if it already exists.
    async fn zset_add(&self, key: &str, member: &str, score: f64) -> CacheResult<()>;

    /// Members by ascending score, inclusive range.
    async fn zset_range(&self, key: &str, start: isize, stop: isize) -> CacheResult<Vec<String>>;

    /// Members by descending score, inclusive range.
    async fn zset_rev_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> CacheResult<Vec<String>>;

    /// Ascending rank of a member, or `None` if absent.
    async fn zset_rank(&self, key: &str, member: &str) -> CacheResult<Option<u64>>;

    /// Score of a member, or `None` if absent.
    async fn zset_score(&self, key: &str, member: &str) -> CacheResult<Option<f64>>;

    // ---- patterns ----

    /// Enumerate keys matching a glob pattern.
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>>;

    /// Delete every key matching a glob pattern, returning the count.
    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64>;

    // ---- pub/sub ----

    /// Publish a raw payload to a channel. Fire-and-forget at the caller's
    /// level; this still reports transport failures so they can be logged.
    async fn publish(&self, channel: &str, payload: &str) -> CacheResult<()>;

    // ---- administration ----

    /// Drop every key in the selected database. Test/ops use only.
    async fn flush_all(&self) -> CacheResult<()>;

    /// Point-in-time store statistics.
    async fn stats(&self) -> CacheResult<StoreStats>;

    /// Best-effort availability hint. `false` means recent operations have
    /// been failing; callers may skip the cache entirely, but every
    /// operation already fails soft so this is an optimization only.
    fn is_available(&self) -> bool;
}
