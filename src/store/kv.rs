//! Key-value store capability.

use crate::config::Result;
use async_trait::async_trait;
use std::time::Duration;

/// String-keyed store with optional per-entry lifetime.
///
/// Implementations provide no locking or compare-and-set; callers that
/// read-modify-write accept lost updates under concurrency.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the value under `key`, or `None` if it was never written or has expired.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Store` if the backend cannot be reached.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// A `ttl` of `None` keeps the entry until it is overwritten or purged externally.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Store` if the backend cannot be reached.
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;
}
