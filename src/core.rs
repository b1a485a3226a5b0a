//! Core system components.
//!
//! Contains the edge service, rate limiting middleware, response cache and clock.

pub mod cache;
pub mod clock;
pub mod edge;
pub mod middleware;
