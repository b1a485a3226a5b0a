//! Security components.
//!
//! Session token minting.

pub mod token;

pub use token::{RandomTokenGenerator, TOKEN_LEN, TokenGenerator};
