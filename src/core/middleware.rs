//! Middleware components.
//!
//! Per-client rate limiting applied before any request dispatch.

mod ratelimit;

pub use ratelimit::{RATE_WINDOW_SECS, RateLimiter, rate_limit_key};
