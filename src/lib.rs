//! Library definitions.
//!
//! Exports core modules, types, and the edge service implementation.

pub mod config;
pub mod core;
pub mod security;
pub mod store;
pub mod web;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;
pub use config::{Config, GateError, RateLimitFailureMode, Result};
pub use crate::core::cache::{EdgeCache, LocalEdgeCache};
pub use crate::core::edge::{EdgeRequest, EdgeResponse, EdgeService, SessionRouter};
pub use crate::core::middleware::RateLimiter;
pub use security::{RandomTokenGenerator, TokenGenerator};
pub use store::{KvStore, MemoryStore, RedisStore, SessionRecord, SessionStore};
pub use web::ui::{HtmlRenderer, Renderer, preload_templates};
