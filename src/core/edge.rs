//! Edge request handling.
//!
//! Request and response models, the dispatch state machine, and the pingora
//! service that serves every request without an upstream.

pub mod headers;
pub mod request;
pub mod response;
pub mod router;
pub mod service;

pub use request::EdgeRequest;
pub use response::{EdgeResponse, serve_response};
pub use router::SessionRouter;
pub use service::{EdgeService, RequestCtx};
