//! Per-client fixed-window rate limiting.
//!
//! Counts requests per client address in one-minute buckets stored in the
//! shared `KvStore` under `rate_limit_{address}_{bucket}` with a 60 second
//! lifetime. The check is read-then-write with no atomic increment, so
//! concurrent requests from one client may under-count. The cap is a
//! best-effort bound, not an exact quota.

use crate::config::{RateLimitFailureMode, Result};
use crate::core::clock::{Clock, SystemClock};
use crate::store::KvStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Bucket width and counter lifetime.
pub const RATE_WINDOW_SECS: u64 = 60;

#[must_use]
pub fn rate_limit_key(client_addr: &str, bucket: u64) -> String {
    format!("rate_limit_{client_addr}_{bucket}")
}

#[derive(Clone)]
pub struct RateLimiter {
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    max_per_window: u32,
    failure_mode: RateLimitFailureMode,
}

impl RateLimiter {
    /// Creates a `RateLimiter` allowing `max_per_window` requests per client per minute.
    #[must_use]
    pub fn new(
        kv: Arc<dyn KvStore>,
        max_per_window: u32,
        failure_mode: RateLimitFailureMode,
    ) -> Self {
        Self {
            kv,
            clock: Arc::new(SystemClock),
            max_per_window,
            failure_mode,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns whether a request from `client_addr` may proceed, recording it if so.
    ///
    /// Store failures resolve according to the configured failure mode.
    pub async fn allow(&self, client_addr: &str) -> bool {
        match self.check_and_record(client_addr).await {
            Ok(allowed) => allowed,
            Err(e) => {
                let allowed = self.failure_mode == RateLimitFailureMode::Open;
                warn!(
                    client = %client_addr,
                    error = %e,
                    fail_open = allowed,
                    "Rate limit store unavailable"
                );
                allowed
            }
        }
    }

    /// Reads the current bucket's count and, if below the cap, writes back count + 1.
    ///
    /// A denied request leaves the counter untouched.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Store` if the counter cannot be read or written.
    pub async fn check_and_record(&self, client_addr: &str) -> Result<bool> {
        let bucket = self.clock.now_secs() / RATE_WINDOW_SECS;
        let key = rate_limit_key(client_addr, bucket);

        let count = match self.kv.get(&key).await? {
            Some(raw) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
                debug!(key = %key, value = %raw, "Unparsable rate counter, treating as zero");
                0
            }),
            None => 0,
        };

        if count >= self.max_per_window {
            return Ok(false);
        }

        self.kv
            .put(
                &key,
                (count + 1).to_string(),
                Some(Duration::from_secs(RATE_WINDOW_SECS)),
            )
            .await?;
        Ok(true)
    }
}
