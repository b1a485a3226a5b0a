//! Key-value storage.
//!
//! `KvStore` is the only state shared between concurrent requests. Session
//! records and rate counters both live in it; the backend is chosen at
//! startup (Redis when configured, otherwise the in-process map).

mod kv;
mod memory;
mod remote;
mod session;

pub use kv::KvStore;
pub use memory::{MemoryStore, SWEEP_INTERVAL};
pub use remote::RedisStore;
pub use session::{MISSING_GROUP_ID, SessionRecord, SessionStore, StorageKey};
