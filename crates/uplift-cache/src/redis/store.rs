//! Redis implementation of the store adapter.

use crate::config::{CacheConfig, ReconnectConfig};
use crate::error::{CacheError, CacheResult};
use crate::store::{StoreBackend, StoreStats};
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Pool};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Redis-backed [`StoreBackend`].
///
/// Holds the process-wide connection pool and the availability state.
/// Constructed explicitly and passed to each component that needs it; there
/// is no module-level singleton.
pub struct RedisStore {
    pool: Pool,
    reconnect: ReconnectConfig,
    /// Best-effort hint that recent operations have been succeeding.
    available: AtomicBool,
    consecutive_failures: AtomicU32,
    /// When set, no pool access is attempted before this instant. Entered
    /// after `reconnect.max_attempts` consecutive failures; cleared lazily
    /// by the next operation attempted after it elapses.
    retry_after: Mutex<Option<Instant>>,
}

impl RedisStore {
    /// Connect to Redis and return the store.
    ///
    /// See [`super::create_pool`] for the startup behavior when the backend
    /// is unreachable.
    pub async fn connect(config: &CacheConfig) -> CacheResult<Self> {
        let pool = super::create_pool(config).await?;
        let available = super::ping(&pool).await.is_ok();
        Ok(Self {
            pool,
            reconnect: config.reconnect.clone(),
            available: AtomicBool::new(available),
            consecutive_failures: AtomicU32::new(0),
            retry_after: Mutex::new(None),
        })
    }

    /// Build a store around an existing pool (shared with other subsystems).
    pub fn with_pool(pool: Pool, reconnect: ReconnectConfig) -> Self {
        Self {
            pool,
            reconnect,
            available: AtomicBool::new(false),
            consecutive_failures: AtomicU32::new(0),
            retry_after: Mutex::new(None),
        }
    }

    /// Close the store. The pool is dropped with the struct; this exists so
    /// callers have an explicit lifecycle hook for shutdown ordering.
    pub fn close(self) {
        self.pool.close();
    }

    /// Get a connection, honoring the lazy-reconnect cooldown.
    async fn conn(&self) -> CacheResult<deadpool_redis::Connection> {
        {
            let mut retry_after = self.retry_after.lock();
            match *retry_after {
                Some(at) if Instant::now() < at => return Err(CacheError::Unavailable),
                Some(_) => *retry_after = None,
                None => {}
            }
        }

        match self.pool.get().await {
            Ok(conn) => Ok(conn),
            Err(e) => {
                self.note_failure();
                Err(e.into())
            }
        }
    }

    /// Record the outcome of a command and convert its error type.
    fn track<T>(&self, result: Result<T, redis::RedisError>) -> CacheResult<T> {
        match result {
            Ok(value) => {
                self.note_success();
                Ok(value)
            }
            Err(e) => {
                self.note_failure();
                Err(e.into())
            }
        }
    }

    fn note_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        if !self.available.swap(true, Ordering::Relaxed) {
            info!("cache backend available");
        }
    }

    fn note_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.reconnect.max_attempts {
            let delay = self.reconnect.delay_for_attempt(failures);
            *self.retry_after.lock() = Some(Instant::now() + delay);
        }
        if self.available.swap(false, Ordering::Relaxed) {
            warn!("cache backend unavailable");
        }
    }
}

#[async_trait]
impl StoreBackend for RedisStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = self.track(conn.get(key).await)?;
        match &value {
            Some(_) => debug!(key, "cache hit"),
            None => debug!(key, "cache miss"),
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        match ttl {
            Some(ttl) => {
                let secs = ttl.as_secs().max(1);
                self.track(conn.set_ex::<_, _, ()>(key, value, secs).await)?;
                debug!(key, ttl_secs = secs, "cached key");
            }
            None => {
                self.track(conn.set::<_, _, ()>(key, value).await)?;
                debug!(key, "cached key without expiry");
            }
        }
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn().await?;
        let deleted: i64 = self.track(conn.del(keys).await)?;
        Ok(deleted as u64)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        self.track(conn.exists(key).await)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        self.track(conn.expire(key, ttl.as_secs().max(1) as i64).await)
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let mut conn = self.conn().await?;
        let secs: i64 = self.track(conn.ttl(key).await)?;
        // -2 means no key, -1 means no expiry.
        if secs < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_secs(secs as u64)))
        }
    }

    async fn incr(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let mut conn = self.conn().await?;
        self.track(conn.incr(key, delta).await)
    }

    async fn hash_get(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        self.track(conn.hget(key, field).await)
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        let _: i64 = self.track(conn.hset(key, field, value).await)?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> CacheResult<Vec<(String, String)>> {
        let mut conn = self.conn().await?;
        let map: HashMap<String, String> = self.track(conn.hgetall(key).await)?;
        Ok(map.into_iter().collect())
    }

    async fn hash_delete(&self, key: &str, field: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let removed: i64 = self.track(conn.hdel(key, field).await)?;
        Ok(removed > 0)
    }

    async fn list_push_left(&self, key: &str, value: &str) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        let len: i64 = self.track(conn.lpush(key, value).await)?;
        Ok(len as u64)
    }

    async fn list_push_right(&self, key: &str, value: &str) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        let len: i64 = self.track(conn.rpush(key, value).await)?;
        Ok(len as u64)
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> CacheResult<Vec<String>> {
        let mut conn = self.conn().await?;
        self.track(conn.lrange(key, start, stop).await)
    }

    async fn list_trim(&self, key: &str, start: isize, stop: isize) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        self.track(conn.ltrim::<_, ()>(key, start, stop).await)
    }

    async fn zset_add(&self, key: &str, member: &str, score: f64) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        let _: i64 = self.track(conn.zadd(key, member, score).await)?;
        Ok(())
    }

    async fn zset_range(&self, key: &str, start: isize, stop: isize) -> CacheResult<Vec<String>> {
        let mut conn = self.conn().await?;
        self.track(conn.zrange(key, start, stop).await)
    }

    async fn zset_rev_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> CacheResult<Vec<String>> {
        let mut conn = self.conn().await?;
        self.track(conn.zrevrange(key, start, stop).await)
    }

    async fn zset_rank(&self, key: &str, member: &str) -> CacheResult<Option<u64>> {
        let mut conn = self.conn().await?;
        let rank: Option<i64> = self.track(conn.zrank(key, member).await)?;
        Ok(rank.map(|r| r as u64))
    }

    async fn zset_score(&self, key: &str, member: &str) -> CacheResult<Option<f64>> {
        let mut conn = self.conn().await?;
        self.track(conn.zscore(key, member).await)
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.conn().await?;
        // KEYS is a full enumeration; acceptable for this key-space size.
        let keys: Vec<String> = self.track(
            redis::cmd("KEYS")
                .arg(pattern)
                .query_async(&mut *conn)
                .await,
        )?;
        Ok(keys)
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let keys = self.keys(pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn().await?;
        let deleted: i64 = self.track(conn.del(&keys).await)?;
        debug!(pattern, deleted, "deleted keys matching pattern");
        Ok(deleted as u64)
    }

    async fn publish(&self, channel: &str, payload: &str) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        self.track(conn.publish::<_, _, ()>(channel, payload).await)
    }

    async fn flush_all(&self) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        self.track(
            redis::cmd("FLUSHDB")
                .query_async::<()>(&mut *conn)
                .await,
        )
    }

    async fn stats(&self) -> CacheResult<StoreStats> {
        let mut conn = self.conn().await?;
        let entry_count: i64 =
            self.track(redis::cmd("DBSIZE").query_async(&mut *conn).await)?;
        let info: String = self.track(redis::cmd("INFO").query_async(&mut *conn).await)?;

        Ok(StoreStats {
            entry_count: entry_count.max(0) as u64,
            memory_used: parse_info_field(&info, "used_memory"),
            connected_clients: parse_info_field(&info, "connected_clients"),
            uptime_secs: parse_info_field(&info, "uptime_in_seconds"),
        })
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }
}

/// Pull a numeric field out of an INFO response.
fn parse_info_field(info: &str, field: &str) -> u64 {
    info.lines()
        .find_map(|line| line.strip_prefix(field)?.strip_prefix(':'))
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}
