//! Shared test doubles for the cache subsystem.
//!
//! `MemoryStore` mimics the backing store's data types and expiry semantics
//! with a manually advanceable clock, so TTL behavior is testable without a
//! live server. `FailingStore` refuses every operation, for fail-soft tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use uplift_cache::{CacheError, CacheResult, StoreBackend, StoreStats};

/// In-memory stand-in for the backing store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Logical clock; `advance` moves it forward.
    now: Duration,
    strings: HashMap<String, String>,
    hashes: HashMap<String, HashMap<String, String>>,
    lists: HashMap<String, Vec<String>>,
    zsets: HashMap<String, Vec<(String, f64)>>,
    /// Absolute logical deadline per key.
    expiries: HashMap<String, Duration>,
    published: Vec<(String, String)>,
}

impl Inner {
    fn purge(&mut self, key: &str) {
        if let Some(deadline) = self.expiries.get(key) {
            if *deadline <= self.now {
                self.remove(key);
            }
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        let existed = self.strings.remove(key).is_some()
            | self.hashes.remove(key).is_some()
            | self.lists.remove(key).is_some()
            | self.zsets.remove(key).is_some();
        self.expiries.remove(key);
        existed
    }

    fn live_keys(&mut self) -> Vec<String> {
        let expired: Vec<String> = self
            .expiries
            .iter()
            .filter(|(_, deadline)| **deadline <= self.now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.remove(&key);
        }

        let mut keys: Vec<String> = self
            .strings
            .keys()
            .chain(self.hashes.keys())
            .chain(self.lists.keys())
            .chain(self.zsets.keys())
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    fn sorted_members(&self, key: &str) -> Vec<(String, f64)> {
        let mut members = self.zsets.get(key).cloned().unwrap_or_default();
        members.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then_with(|| a.0.cmp(&b.0)));
        members
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the logical clock forward, expiring anything due.
    pub fn advance(&self, by: Duration) {
        let mut inner = self.inner.lock();
        inner.now += by;
        inner.live_keys();
    }

    /// Messages recorded by `publish`, oldest first.
    pub fn published(&self) -> Vec<(String, String)> {
        self.inner.lock().published.clone()
    }

    /// Remaining logical TTL for a key, if any.
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        let inner = self.inner.lock();
        inner.expiries.get(key).map(|deadline| {
            deadline.checked_sub(inner.now).unwrap_or(Duration::ZERO)
        })
    }
}

/// Redis-style inclusive range with negative-index support.
fn range_bounds(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let resolve = |index: isize| -> isize {
        if index < 0 {
            index + len as isize
        } else {
            index
        }
    };
    let start = resolve(start).max(0);
    let stop = resolve(stop).min(len as isize - 1);
    if start > stop {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// Glob matcher covering `*`, the only wildcard the key taxonomy emits.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }
    let parts: Vec<&str> = pattern.split('*').collect();

    if !text.starts_with(parts[0]) {
        return false;
    }
    let mut pos = parts[0].len();

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match text[pos..].find(part) {
            Some(found) => pos = pos + found + part.len(),
            None => return false,
        }
    }

    let last = parts[parts.len() - 1];
    last.is_empty() || text[pos..].ends_with(last)
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        Ok(inner.strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let mut inner = self.inner.lock();
        inner.strings.insert(key.to_string(), value.to_string());
        match ttl {
            Some(ttl) => {
                let deadline = inner.now + ttl;
                inner.expiries.insert(key.to_string(), deadline);
            }
            None => {
                inner.expiries.remove(key);
            }
        }
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> CacheResult<u64> {
        let mut inner = self.inner.lock();
        let mut deleted = 0;
        for key in keys {
            inner.purge(key);
            if inner.remove(key) {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        Ok(inner.strings.contains_key(key)
            || inner.hashes.contains_key(key)
            || inner.lists.contains_key(key)
            || inner.zsets.contains_key(key))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        let exists = inner.strings.contains_key(key)
            || inner.hashes.contains_key(key)
            || inner.lists.contains_key(key)
            || inner.zsets.contains_key(key);
        if exists {
            let deadline = inner.now + ttl;
            inner.expiries.insert(key.to_string(), deadline);
        }
        Ok(exists)
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        let now = inner.now;
        Ok(inner
            .expiries
            .get(key)
            .map(|deadline| deadline.checked_sub(now).unwrap_or(Duration::ZERO)))
    }

    async fn incr(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        let current: i64 = inner
            .strings
            .get(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(0);
        let next = current + delta;
        inner.strings.insert(key.to_string(), next.to_string());
        Ok(next)
    }

    async fn hash_get(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        Ok(inner
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field).cloned()))
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        inner
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> CacheResult<Vec<(String, String)>> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        Ok(inner
            .hashes
            .get(key)
            .map(|hash| hash.iter().map(|(f, v)| (f.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn hash_delete(&self, key: &str, field: &str) -> CacheResult<bool> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        Ok(inner
            .hashes
            .get_mut(key)
            .map(|hash| hash.remove(field).is_some())
            .unwrap_or(false))
    }

    async fn list_push_left(&self, key: &str, value: &str) -> CacheResult<u64> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        let list = inner.lists.entry(key.to_string()).or_default();
        list.insert(0, value.to_string());
        Ok(list.len() as u64)
    }

    async fn list_push_right(&self, key: &str, value: &str) -> CacheResult<u64> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        let list = inner.lists.entry(key.to_string()).or_default();
        list.push(value.to_string());
        Ok(list.len() as u64)
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> CacheResult<Vec<String>> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        let list = inner.lists.get(key).cloned().unwrap_or_default();
        Ok(match range_bounds(list.len(), start, stop) {
            Some((start, stop)) => list[start..=stop].to_vec(),
            None => Vec::new(),
        })
    }

    async fn list_trim(&self, key: &str, start: isize, stop: isize) -> CacheResult<()> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        if let Some(list) = inner.lists.get_mut(key) {
            *list = match range_bounds(list.len(), start, stop) {
                Some((start, stop)) => list[start..=stop].to_vec(),
                None => Vec::new(),
            };
        }
        Ok(())
    }

    async fn zset_add(&self, key: &str, member: &str, score: f64) -> CacheResult<()> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        let zset = inner.zsets.entry(key.to_string()).or_default();
        match zset.iter_mut().find(|(m, _)| m == member) {
            Some(entry) => entry.1 = score,
            None => zset.push((member.to_string(), score)),
        }
        Ok(())
    }

    async fn zset_range(&self, key: &str, start: isize, stop: isize) -> CacheResult<Vec<String>> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        let members = inner.sorted_members(key);
        Ok(match range_bounds(members.len(), start, stop) {
            Some((start, stop)) => members[start..=stop].iter().map(|(m, _)| m.clone()).collect(),
            None => Vec::new(),
        })
    }

    async fn zset_rev_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> CacheResult<Vec<String>> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        let mut members = inner.sorted_members(key);
        members.reverse();
        Ok(match range_bounds(members.len(), start, stop) {
            Some((start, stop)) => members[start..=stop].iter().map(|(m, _)| m.clone()).collect(),
            None => Vec::new(),
        })
    }

    async fn zset_rank(&self, key: &str, member: &str) -> CacheResult<Option<u64>> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        Ok(inner
            .sorted_members(key)
            .iter()
            .position(|(m, _)| m == member)
            .map(|rank| rank as u64))
    }

    async fn zset_score(&self, key: &str, member: &str) -> CacheResult<Option<f64>> {
        let mut inner = self.inner.lock();
        inner.purge(key);
        Ok(inner
            .zsets
            .get(key)
            .and_then(|zset| zset.iter().find(|(m, _)| m == member).map(|(_, s)| *s)))
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut inner = self.inner.lock();
        Ok(inner
            .live_keys()
            .into_iter()
            .filter(|key| glob_match(pattern, key))
            .collect())
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let matches = self.keys(pattern).await?;
        self.delete(&matches).await
    }

    async fn publish(&self, channel: &str, payload: &str) -> CacheResult<()> {
        self.inner
            .lock()
            .published
            .push((channel.to_string(), payload.to_string()));
        Ok(())
    }

    async fn flush_all(&self) -> CacheResult<()> {
        let mut inner = self.inner.lock();
        inner.strings.clear();
        inner.hashes.clear();
        inner.lists.clear();
        inner.zsets.clear();
        inner.expiries.clear();
        Ok(())
    }

    async fn stats(&self) -> CacheResult<StoreStats> {
        let mut inner = self.inner.lock();
        Ok(StoreStats {
            entry_count: inner.live_keys().len() as u64,
            memory_used: 1024,
            connected_clients: 1,
            uptime_secs: inner.now.as_secs(),
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Store double whose every operation fails, as if the backend is down.
pub struct FailingStore;

#[async_trait]
impl StoreBackend for FailingStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Unavailable)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> CacheResult<()> {
        Err(CacheError::Unavailable)
    }

    async fn delete(&self, _keys: &[String]) -> CacheResult<u64> {
        Err(CacheError::Unavailable)
    }

    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::Unavailable)
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> CacheResult<bool> {
        Err(CacheError::Unavailable)
    }

    async fn ttl(&self, _key: &str) -> CacheResult<Option<Duration>> {
        Err(CacheError::Unavailable)
    }

    async fn incr(&self, _key: &str, _delta: i64) -> CacheResult<i64> {
        Err(CacheError::Unavailable)
    }

    async fn hash_get(&self, _key: &str, _field: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Unavailable)
    }

    async fn hash_set(&self, _key: &str, _field: &str, _value: &str) -> CacheResult<()> {
        Err(CacheError::Unavailable)
    }

    async fn hash_get_all(&self, _key: &str) -> CacheResult<Vec<(String, String)>> {
        Err(CacheError::Unavailable)
    }

    async fn hash_delete(&self, _key: &str, _field: &str) -> CacheResult<bool> {
        Err(CacheError::Unavailable)
    }

    async fn list_push_left(&self, _key: &str, _value: &str) -> CacheResult<u64> {
        Err(CacheError::Unavailable)
    }

    async fn list_push_right(&self, _key: &str, _value: &str) -> CacheResult<u64> {
        Err(CacheError::Unavailable)
    }

    async fn list_range(
        &self,
        _key: &str,
        _start: isize,
        _stop: isize,
    ) -> CacheResult<Vec<String>> {
        Err(CacheError::Unavailable)
    }

    async fn list_trim(&self, _key: &str, _start: isize, _stop: isize) -> CacheResult<()> {
        Err(CacheError::Unavailable)
    }

    async fn zset_add(&self, _key: &str, _member: &str, _score: f64) -> CacheResult<()> {
        Err(CacheError::Unavailable)
    }

    async fn zset_range(
        &self,
        _key: &str,
        _start: isize,
        _stop: isize,
    ) -> CacheResult<Vec<String>> {
        Err(CacheError::Unavailable)
    }

    async fn zset_rev_range(
        &self,
        _key: &str,
        _start: isize,
        _stop: isize,
    ) -> CacheResult<Vec<String>> {
        Err(CacheError::Unavailable)
    }

    async fn zset_rank(&self, _key: &str, _member: &str) -> CacheResult<Option<u64>> {
        Err(CacheError::Unavailable)
    }

    async fn zset_score(&self, _key: &str, _member: &str) -> CacheResult<Option<f64>> {
        Err(CacheError::Unavailable)
    }

    async fn keys(&self, _pattern: &str) -> CacheResult<Vec<String>> {
        Err(CacheError::Unavailable)
    }

    async fn delete_pattern(&self, _pattern: &str) -> CacheResult<u64> {
        Err(CacheError::Unavailable)
    }

    async fn publish(&self, _channel: &str, _payload: &str) -> CacheResult<()> {
        Err(CacheError::Unavailable)
    }

    async fn flush_all(&self) -> CacheResult<()> {
        Err(CacheError::Unavailable)
    }

    async fn stats(&self) -> CacheResult<StoreStats> {
        Err(CacheError::Unavailable)
    }

    fn is_available(&self) -> bool {
        false
    }
}
