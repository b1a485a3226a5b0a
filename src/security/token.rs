//! Session token generation.
//!
//! Tokens are opaque and short. They are unguessable only to the extent a
//! 9-character base-36 string is; nothing authenticates them.

use rand::Rng;

pub const TOKEN_LEN: usize = 9;
const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Mints the token attached to each newly published session.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Draws `TOKEN_LEN` base-36 characters from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..TOKEN_LEN)
            .map(|_| char::from(TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())]))
            .collect()
    }
}
