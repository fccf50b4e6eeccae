//! Fixed-window rate limiting on atomic counters.

use crate::error::CacheResult;
use crate::keys::KeySpace;
use crate::store::StoreBackend;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request is within the window's budget.
    pub allowed: bool,
    /// Requests left in the current window, floored at zero.
    pub remaining: u64,
    /// When the current window closes.
    pub reset_at: DateTime<Utc>,
}

/// Fixed-window rate limiter.
///
/// Windows are discrete and non-overlapping, so brief bursts are possible
/// at window boundaries. That is an accepted tradeoff: this limiter is for
/// admission control, not strict fairness.
pub struct RateLimiter {
    store: Arc<dyn StoreBackend>,
    keys: KeySpace,
}

impl RateLimiter {
    /// Create a limiter over the given store and key space.
    pub fn new(store: Arc<dyn StoreBackend>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// Count a request against `bucket` and decide whether to admit it.
    ///
    /// Fails open: when the backing store is unreachable the request is
    /// admitted rather than blocked, since refusing legitimate traffic on a
    /// cache outage is the worse failure.
    pub async fn check(
        &self,
        bucket: &str,
        max_requests: u64,
        window: Duration,
    ) -> RateLimitDecision {
        match self.try_check(bucket, max_requests, window).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(bucket, error = %e, "rate limit check failed, failing open");
                RateLimitDecision {
                    allowed: true,
                    remaining: max_requests,
                    reset_at: Utc::now() + window,
                }
            }
        }
    }

    async fn try_check(
        &self,
        bucket: &str,
        max_requests: u64,
        window: Duration,
    ) -> CacheResult<RateLimitDecision> {
        let key = self.keys.rate_limit(bucket);

        let current = self.store.incr(&key, 1).await?;

        // Only the increment that created the counter sets the expiry.
        // Re-arming it on every hit would keep the window open forever
        // under sustained load.
        if current == 1 {
            self.store.expire(&key, window).await?;
        }

        let remaining_ttl = match self.store.ttl(&key).await? {
            Some(ttl) => ttl,
            None => {
                // The EXPIRE after the creating INCR was lost, so the
                // counter would never reset and the bucket would stay
                // denied once over budget. Repair the window here.
                self.store.expire(&key, window).await?;
                window
            }
        };

        let current = current.max(0) as u64;
        Ok(RateLimitDecision {
            allowed: current <= max_requests,
            remaining: max_requests.saturating_sub(current),
            reset_at: Utc::now() + remaining_ttl,
        })
    }
}
