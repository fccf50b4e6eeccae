//! Cache subsystem configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the cache subsystem.
///
/// All defaults are suitable for local development against an
/// unauthenticated Redis on localhost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Backing store host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Backing store port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional password.
    #[serde(default)]
    pub password: Option<String>,

    /// Logical database index.
    #[serde(default)]
    pub db: u8,

    /// Global prefix applied to every key this subsystem writes.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Reconnect policy.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            db: 0,
            key_prefix: default_key_prefix(),
            pool_size: default_pool_size(),
            connect_timeout_secs: default_connect_timeout(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Builds the Redis connection URL from the individual fields.
    #[must_use]
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }

    /// Returns the connect timeout as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_key_prefix() -> String {
    "uplift".to_string()
}

fn default_pool_size() -> usize {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

/// Reconnect policy for the backing store.
///
/// The store retries with a linearly increasing delay (`backoff_step_ms *
/// attempt`) capped at `backoff_cap_ms`. After `max_attempts` consecutive
/// failures it stops retrying until the next operation is attempted, to
/// avoid reconnect storms against a down dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Maximum consecutive attempts before backing off entirely.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff step in milliseconds.
    #[serde(default = "default_backoff_step")]
    pub backoff_step_ms: u64,

    /// Maximum backoff delay in milliseconds.
    #[serde(default = "default_backoff_cap")]
    pub backoff_cap_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step_ms: default_backoff_step(),
            backoff_cap_ms: default_backoff_cap(),
        }
    }
}

impl ReconnectConfig {
    /// Delay before the given 1-based attempt.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.backoff_step_ms.saturating_mul(u64::from(attempt));
        Duration::from_millis(delay.min(self.backoff_cap_ms))
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_step() -> u64 {
    200
}

fn default_backoff_cap() -> u64 {
    2000
}
