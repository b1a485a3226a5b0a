//! Test utilities and shared configuration.
//!
//! This module provides common helpers for unit and integration tests,
//! reducing duplication across the codebase.

use crate::config::{Config, GateError, RateLimitFailureMode, Result};
use crate::core::clock::Clock;
use crate::security::TokenGenerator;
use crate::store::{KvStore, MemoryStore};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

const RATE_KEY_PREFIX: &str = "rate_limit_";

/// Creates a standard configuration for testing purposes.
///
/// This configuration has:
/// - API key `secret`
/// - 100 requests per minute, fail-open
/// - In-process storage (no Redis)
#[must_use]
pub fn create_test_config() -> Arc<Config> {
    Arc::new(Config {
        listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
        api_key: "secret".to_string(),
        rate_limit_per_minute: 100,
        rate_limit_failure_mode: RateLimitFailureMode::Open,
        analytics_id: None,
        redis_url: None,
        session_key_prefix: "meeting".to_string(),
        client_ip_header: None,
        max_body_size: 64 * 1024,
        cache_max_entries: 1_000,
        app_name: "TestApp".to_string(),
        log_format: "pretty".to_string(),
    })
}

/// Lets spawned background tasks (cache population) run to completion.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new(secs: u64) -> Self {
        Self {
            secs: AtomicU64::new(secs),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.secs.load(Ordering::SeqCst)
    }
}

/// In-memory store that counts operations and can be switched to fail.
///
/// Rate-limit counter traffic is counted separately from session traffic.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    session_puts: AtomicUsize,
    session_gets: AtomicUsize,
    failing: AtomicBool,
}

impl CountingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every operation returns `GateError::Store`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Writes to anything other than rate-limit counters.
    pub fn session_puts(&self) -> usize {
        self.session_puts.load(Ordering::SeqCst)
    }

    /// Reads of anything other than rate-limit counters.
    pub fn session_gets(&self) -> usize {
        self.session_gets.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GateError::Store("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if !key.starts_with(RATE_KEY_PREFIX) {
            self.session_gets.fetch_add(1, Ordering::SeqCst);
        }
        self.check()?;
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        self.check()?;
        if !key.starts_with(RATE_KEY_PREFIX) {
            self.session_puts.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.put(key, value, ttl).await
    }
}

/// Deterministic tokens: `{prefix}000001`, `{prefix}000002`, ...
#[derive(Debug)]
pub struct SequenceTokens {
    prefix: String,
    next: AtomicU64,
}

impl SequenceTokens {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl TokenGenerator for SequenceTokens {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}{n:06}", self.prefix)
    }
}
