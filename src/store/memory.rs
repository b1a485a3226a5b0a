//! In-process key-value store.
//!
//! Backed by a lock-free `papaya` map. Expired entries read as absent and are
//! evicted on the next read of that key. Every `SWEEP_INTERVAL` writes the
//! whole map is swept, so keys that are never read again (old rate-limit
//! buckets) do not accumulate.

use crate::config::Result;
use crate::core::clock::{Clock, SystemClock};
use crate::store::KvStore;
use async_trait::async_trait;
use papaya::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Writes between full sweeps of expired entries.
pub const SWEEP_INTERVAL: u64 = 128;

struct Entry {
    value: String,
    expires_at: Option<u64>,
}

impl Entry {
    fn is_live(&self, now: u64) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

pub struct MemoryStore {
    entries: HashMap<String, Entry>,
    clock: Arc<dyn Clock>,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
            writes: AtomicU64::new(0),
        }
    }

    /// Number of resident entries, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.pin().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_secs();
        let entries = self.entries.pin();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.remove(key);
        }
        expired.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now_secs();
        let entries = self.entries.pin();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|ttl| self.clock.now_secs().saturating_add(ttl.as_secs()));
        self.entries
            .pin()
            .insert(key.to_string(), Entry { value, expires_at });

        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % SWEEP_INTERVAL == 0 {
            let purged = self.purge_expired();
            if purged > 0 {
                debug!(purged, "Swept expired store entries");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ManualClock;

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryStore::new();
        store.put("k", "one".into(), None).await.unwrap();
        store.put("k", "two".into(), None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = MemoryStore::with_clock(clock.clone());
        store
            .put("k", "v".into(), Some(Duration::from_secs(60)))
            .await
            .unwrap();

        clock.advance(59);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        clock.advance(1);
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_no_ttl_never_expires() {
        let clock = Arc::new(ManualClock::new(0));
        let store = MemoryStore::with_clock(clock.clone());
        store.put("k", "v".into(), None).await.unwrap();

        clock.advance(10 * 365 * 86_400);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_entries() {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = MemoryStore::with_clock(clock.clone());
        store
            .put("short", "v".into(), Some(Duration::from_secs(10)))
            .await
            .unwrap();
        store
            .put("long", "v".into(), Some(Duration::from_secs(100)))
            .await
            .unwrap();
        store.put("forever", "v".into(), None).await.unwrap();

        clock.advance(10);
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("long").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_unread_expired_keys_do_not_accumulate() {
        let clock = Arc::new(ManualClock::new(6_000));
        let store = MemoryStore::with_clock(clock.clone());

        for i in 0..1_000u32 {
            let key = format!("rate_limit_10.0.{}.{}_{i}", i / 256, i % 256);
            store
                .put(&key, "1".into(), Some(Duration::from_secs(60)))
                .await
                .unwrap();
            clock.advance(60);
        }

        assert!(store.len() <= SWEEP_INTERVAL as usize);
    }
}
