//! Edge response cache.
//!
//! Read-path responses are cached keyed by the full request (method and
//! URL) for a short fixed lifetime. The cache is populated off the response
//! path; a failed or skipped store only costs a later store read. The cache
//! is bounded and evicts its oldest entry when full.

use crate::config::{GateError, Result};
use crate::core::clock::{Clock, SystemClock};
use crate::core::edge::{EdgeRequest, EdgeResponse};
use async_trait::async_trait;
use papaya::HashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Lifetime of cached read responses, also advertised as `s-maxage`.
pub const CACHE_TTL_SECS: u64 = 60;

/// Cache key: `"{METHOD} {url}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity(String);

impl RequestIdentity {
    #[must_use]
    pub fn of(request: &EdgeRequest) -> Self {
        Self(format!("{} {}", request.method, request.url))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
pub trait EdgeCache: Send + Sync {
    /// Returns the live cached response for `identity`, if any.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Cache` if the cache cannot be consulted.
    async fn lookup(&self, identity: &RequestIdentity) -> Result<Option<EdgeResponse>>;

    /// Caches `response` under `identity` for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Cache` if the entry cannot be stored.
    async fn store(
        &self,
        identity: RequestIdentity,
        response: EdgeResponse,
        ttl: Duration,
    ) -> Result<()>;
}

struct CachedEntry {
    response: EdgeResponse,
    expires_at: u64,
    seq: u64,
}

/// Insertion order of cached entries, oldest first.
///
/// A key stored twice appears twice. Only the record whose `seq` matches the
/// live entry owns it; older records are skipped when popped.
#[derive(Default)]
struct Admission {
    queue: VecDeque<(String, u64)>,
    next_seq: u64,
}

/// In-process cache bounded to `max_entries`.
///
/// Entries are admitted in insertion order. Expired entries at the front of
/// that order are dropped on each store, and when the cache is full the
/// oldest entry is evicted to make room.
pub struct LocalEdgeCache {
    entries: HashMap<String, CachedEntry>,
    admission: Mutex<Admission>,
    clock: Arc<dyn Clock>,
    max_entries: usize,
}

impl LocalEdgeCache {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            admission: Mutex::new(Admission::default()),
            clock: Arc::new(SystemClock),
            max_entries,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
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
}

#[async_trait]
impl EdgeCache for LocalEdgeCache {
    async fn lookup(&self, identity: &RequestIdentity) -> Result<Option<EdgeResponse>> {
        let now = self.clock.now_secs();
        let entries = self.entries.pin();
        match entries.get(identity.as_str()) {
            Some(entry) if now < entry.expires_at => Ok(Some(entry.response.clone())),
            Some(_) => {
                entries.remove(identity.as_str());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn store(
        &self,
        identity: RequestIdentity,
        response: EdgeResponse,
        ttl: Duration,
    ) -> Result<()> {
        if self.max_entries == 0 {
            return Err(GateError::Cache("edge cache disabled".to_string()));
        }

        let now = self.clock.now_secs();
        let entries = self.entries.pin();
        let mut admission = self
            .admission
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let seq = admission.next_seq;
        admission.next_seq += 1;
        entries.insert(
            identity.0.clone(),
            CachedEntry {
                response,
                expires_at: now.saturating_add(ttl.as_secs()),
                seq,
            },
        );
        admission.queue.push_back((identity.0, seq));

        while let Some((key, seq)) = admission.queue.front() {
            let owned = entries.get(key).filter(|entry| entry.seq == *seq);
            let evict = match owned {
                None => true,
                Some(entry) => now >= entry.expires_at || entries.len() > self.max_entries,
            };
            if !evict {
                break;
            }
            if owned.is_some() {
                entries.remove(key);
            }
            admission.queue.pop_front();
        }

        Ok(())
    }
}
