//! Redis-backed store adapter.

mod store;

pub use store::RedisStore;

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use deadpool_redis::{Config, Pool, Runtime};
use tracing::{info, warn};

/// Create a Redis connection pool for the cache subsystem.
///
/// The pool is verified with a PING under the configured reconnect policy.
/// A store whose backend is down at startup is still returned: connections
/// are established lazily and every operation fails soft, so an unreachable
/// backend degrades the application instead of preventing it from starting.
pub async fn create_pool(config: &CacheConfig) -> CacheResult<Pool> {
    let cfg = Config::from_url(config.url());

    let pool = cfg
        .builder()
        .map_err(|e| CacheError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| CacheError::Configuration(format!("Failed to create pool: {}", e)))?;

    for attempt in 1..=config.reconnect.max_attempts {
        match ping(&pool).await {
            Ok(()) => {
                info!("Redis connection pool created");
                return Ok(pool);
            }
            Err(e) => {
                let delay = config.reconnect.delay_for_attempt(attempt);
                warn!(
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Redis unreachable during startup"
                );
                if attempt < config.reconnect.max_attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    warn!("Redis unreachable after startup retries; continuing degraded");
    Ok(pool)
}

/// Verify a pool with a PING round-trip.
pub(crate) async fn ping(pool: &Pool) -> CacheResult<()> {
    let mut conn = pool.get().await?;
    let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
    Ok(())
}
