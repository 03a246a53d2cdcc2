//! Rate Limiting Infrastructure
//!
//! Fixed-window counters keyed by an arbitrary string (typically
//! `scope:client-ip`).

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::sync::Mutex;

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }

    /// Start of the window containing `now_ms`
    pub fn window_start(&self, now_ms: i64) -> i64 {
        let window_ms = self.window_ms().max(1);
        (now_ms / window_ms) * window_ms
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

impl RateLimitResult {
    /// Seconds until the window resets, rounded up (for `Retry-After`)
    pub fn retry_after_secs(&self, now_ms: i64) -> u64 {
        let wait_ms = (self.reset_at_ms - now_ms).max(0) as u64;
        wait_ms.div_ceil(1000)
    }
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit backend unavailable: {0}")]
    Backend(String),
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Count one request against `key` and report whether it is allowed
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError>;
}

/// Milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// One key's current window
#[derive(Debug, Clone, Copy)]
struct Window {
    start_ms: i64,
    reset_at_ms: i64,
    count: u32,
}

/// Process-local fixed-window store
///
/// Counters live only as long as the process. Once the map grows past
/// `sweep_threshold`, windows that have already reset are evicted; keys may
/// use different window lengths, so each entry carries its own reset time.
#[derive(Debug)]
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, Window>>,
    sweep_threshold: usize,
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::with_sweep_threshold(10_000)
    }

    pub fn with_sweep_threshold(sweep_threshold: usize) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            sweep_threshold,
        }
    }

    /// Same as [`RateLimitStore::check_and_increment`] with an explicit clock
    pub async fn check_at(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> RateLimitResult {
        let start_ms = config.window_start(now_ms);
        let reset_at_ms = start_ms + config.window_ms();

        let mut windows = self.windows.lock().await;

        if windows.len() > self.sweep_threshold {
            windows.retain(|_, window| window.reset_at_ms > now_ms);
        }

        let fresh = Window {
            start_ms,
            reset_at_ms,
            count: 0,
        };
        let window = windows.entry(key.to_string()).or_insert(fresh);
        if window.start_ms != start_ms {
            *window = fresh;
        }
        window.count = window.count.saturating_add(1);

        let count = window.count;

        RateLimitResult {
            allowed: count <= config.max_requests,
            remaining: config.max_requests.saturating_sub(count),
            reset_at_ms,
        }
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError> {
        Ok(self.check_at(key, config, now_ms()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_start_alignment() {
        let config = RateLimitConfig::new(5, 60);
        assert_eq!(config.window_start(0), 0);
        assert_eq!(config.window_start(59_999), 0);
        assert_eq!(config.window_start(60_000), 60_000);
        assert_eq!(config.window_start(125_000), 120_000);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let result = RateLimitResult {
            allowed: false,
            remaining: 0,
            reset_at_ms: 60_000,
        };
        assert_eq!(result.retry_after_secs(58_500), 2);
        assert_eq!(result.retry_after_secs(61_000), 0);
    }

    #[tokio::test]
    async fn test_allows_up_to_limit_then_blocks() {
        let store = InMemoryRateLimitStore::new();
        let config = RateLimitConfig::new(3, 3600);

        for expected_remaining in [2, 1, 0] {
            let result = store.check_at("signup:1.2.3.4", &config, 1_000).await;
            assert!(result.allowed);
            assert_eq!(result.remaining, expected_remaining);
        }

        let blocked = store.check_at("signup:1.2.3.4", &config, 2_000).await;
        assert!(!blocked.allowed);
        assert_eq!(blocked.reset_at_ms, 3_600_000);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = InMemoryRateLimitStore::new();
        let config = RateLimitConfig::new(1, 60);

        assert!(store.check_at("signin:1.1.1.1", &config, 0).await.allowed);
        assert!(!store.check_at("signin:1.1.1.1", &config, 0).await.allowed);
        assert!(store.check_at("signin:2.2.2.2", &config, 0).await.allowed);
    }

    #[tokio::test]
    async fn test_new_window_resets_count() {
        let store = InMemoryRateLimitStore::new();
        let config = RateLimitConfig::new(1, 60);

        assert!(store.check_at("k", &config, 10_000).await.allowed);
        assert!(!store.check_at("k", &config, 20_000).await.allowed);
        assert!(store.check_at("k", &config, 60_000).await.allowed);
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_windows_of_other_lengths() {
        let store = InMemoryRateLimitStore::with_sweep_threshold(4);
        let sign_up = RateLimitConfig::new(3, 3600);
        let sign_in = RateLimitConfig::new(5, 60);

        for _ in 0..3 {
            assert!(store.check_at("signup:1.2.3.4", &sign_up, 1_000).await.allowed);
        }
        for i in 0..5 {
            let key = format!("signin:10.0.0.{i}");
            store.check_at(&key, &sign_in, 61_000).await;
        }

        // Past the threshold and into the next minute: the minute windows are
        // stale, the hour window is not
        store.check_at("signin:10.0.0.99", &sign_in, 125_000).await;
        assert_eq!(store.windows.lock().await.len(), 2);

        let blocked = store.check_at("signup:1.2.3.4", &sign_up, 126_000).await;
        assert!(!blocked.allowed);
    }

    #[tokio::test]
    async fn test_sweep_keeps_current_window_of_same_length() {
        let store = InMemoryRateLimitStore::with_sweep_threshold(2);
        let config = RateLimitConfig::new(1, 60);

        assert!(store.check_at("a", &config, 0).await.allowed);
        store.check_at("b", &config, 0).await;
        store.check_at("c", &config, 0).await;
        store.check_at("d", &config, 1_000).await;

        assert!(!store.check_at("a", &config, 2_000).await.allowed);
    }
}
