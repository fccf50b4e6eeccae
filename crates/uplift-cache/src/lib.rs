//! Uplift Cache - Application cache and invalidation layer
//!
//! Redis-backed caching subsystem sitting between request handlers and the
//! system of record:
//! - Cache-aside reads with per-domain TTL policy and function memoization
//! - Multi-key invalidation fan-out across user, team, department, and
//!   tenant dimensions
//! - Fixed-window rate limiting on atomic counters
//! - Ordered-set primitives for leaderboards
//! - Best-effort pub/sub for cross-process invalidation broadcast
//!
//! The subsystem degrades gracefully: every public operation fails soft,
//! returning a documented safe default instead of an error, so a backing
//! store outage slows the application down but never fails a request that
//! the system of record could serve.
//!
//! # Example
//!
//! ```rust,ignore
//! use uplift_cache::{Cache, CacheConfig, CacheDomain, KeySpace, RedisStore};
//! use std::sync::Arc;
//!
//! let config = CacheConfig::default();
//! let keys = KeySpace::new(&config.key_prefix);
//! let store = Arc::new(RedisStore::connect(&config).await?);
//! let cache = Cache::new(store);
//!
//! let dashboard = cache
//!     .get_or_set(&keys.dashboard("user-7"), CacheDomain::Dashboard.ttl(), || async {
//!         load_dashboard_from_db("user-7").await
//!     })
//!     .await;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod invalidation;
pub mod keys;
pub mod pubsub;
pub mod rate_limit;
pub mod redis;
pub mod store;

pub use cache::Cache;
pub use config::{CacheConfig, ReconnectConfig};
pub use error::{CacheError, CacheResult};
pub use invalidation::Invalidator;
pub use keys::{CacheDomain, KeySpace};
pub use pubsub::{publish, MessageHandler, Subscriber};
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use self::redis::{create_pool, RedisStore};
pub use store::{StoreBackend, StoreStats};
