//! Redis Implementations
//!
//! Verification-code cache and fixed-window rate-limit counters shared by
//! every API instance.

use std::time::Duration;

use platform::rate_limit::{
    InMemoryRateLimitStore, RateLimitConfig, RateLimitError, RateLimitResult, RateLimitStore,
    now_ms,
};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::domain::repository::KeyValueCache;
use crate::error::{AuthError, AuthResult};
use crate::infra::memory::InMemoryCache;

/// Open a managed connection that reconnects on failure
pub async fn connect(redis_url: &str) -> Result<ConnectionManager, redis::RedisError> {
    let client = redis::Client::open(redis_url)?;
    ConnectionManager::new(client).await
}

/// Redis-backed key/value cache
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| AuthError::Cache(format!("GET failed: {e}")))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()> {
        let mut conn = self.conn.clone();
        // PSETEX rejects a zero expiry
        let ttl_ms = ttl.as_millis().max(1) as u64;
        redis::cmd("PSETEX")
            .arg(key)
            .arg(ttl_ms)
            .arg(value)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AuthError::Cache(format!("PSETEX failed: {e}")))
    }

    async fn delete(&self, key: &str) -> AuthResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| AuthError::Cache(format!("DEL failed: {e}")))
    }
}

/// Fixed-window counters in Redis, one key per window
#[derive(Clone)]
pub struct RedisRateLimitStore {
    conn: ConnectionManager,
}

impl RedisRateLimitStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

impl RateLimitStore for RedisRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError> {
        let window_start = config.window_start(now_ms());
        let reset_at_ms = window_start + config.window_ms();
        let window_key = format!("rate_limit:{key}:{window_start}");

        let mut conn = self.conn.clone();
        let count: u32 = conn
            .incr(&window_key, 1)
            .await
            .map_err(|e| RateLimitError::Backend(format!("INCR failed: {e}")))?;

        if count == 1 {
            redis::cmd("PEXPIRE")
                .arg(&window_key)
                .arg(config.window_ms())
                .query_async::<_, ()>(&mut conn)
                .await
                .map_err(|e| RateLimitError::Backend(format!("PEXPIRE failed: {e}")))?;
        }

        Ok(RateLimitResult {
            allowed: count <= config.max_requests,
            remaining: config.max_requests.saturating_sub(count),
            reset_at_ms,
        })
    }
}

/// Cache selected at start-up
pub enum CacheBackend {
    Redis(RedisCache),
    Memory(InMemoryCache),
}

impl KeyValueCache for CacheBackend {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        match self {
            CacheBackend::Redis(cache) => cache.get(key).await,
            CacheBackend::Memory(cache) => cache.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()> {
        match self {
            CacheBackend::Redis(cache) => cache.set(key, value, ttl).await,
            CacheBackend::Memory(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> AuthResult<()> {
        match self {
            CacheBackend::Redis(cache) => cache.delete(key).await,
            CacheBackend::Memory(cache) => cache.delete(key).await,
        }
    }
}

/// Rate-limit store selected at start-up
pub enum RateLimitBackend {
    Redis(RedisRateLimitStore),
    Memory(InMemoryRateLimitStore),
}

impl RateLimitStore for RateLimitBackend {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError> {
        match self {
            RateLimitBackend::Redis(store) => store.check_and_increment(key, config).await,
            RateLimitBackend::Memory(store) => store.check_and_increment(key, config).await,
        }
    }
}
