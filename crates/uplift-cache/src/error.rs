//! Cache error types.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-related errors.
///
/// These never cross the public facade: every error is converted into the
/// documented safe default (`None`, `false`, `0`, empty) at the boundary so
/// request handlers can always fall back to the system of record.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Redis pool error.
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backing store marked unavailable; the operation was skipped.
    #[error("Cache backend unavailable")]
    Unavailable,

    /// The caller-supplied compute function failed on a cache miss.
    #[error("Compute function failed: {0}")]
    Compute(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true if this error indicates a connectivity problem rather
    /// than bad data, i.e. the operation may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CacheError::Redis(_) | CacheError::Pool(_) | CacheError::Unavailable
        )
    }
}
