//! Password-reset tokens.
//!
//! The raw token (20 random bytes, hex) is only ever sent to the user by email.
//! The database stores its SHA-256 hex digest with a 10-minute expiry, so a leaked
//! row cannot be replayed.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const RESET_TOKEN_BYTES: usize = 20;
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
pub struct ResetToken {
    /// Sent to the user.
    pub raw: String,
    /// Persisted.
    pub hashed: String,
    pub expires_at: DateTime<Utc>,
}

pub fn generate_reset_token() -> ResetToken {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw = hex::encode(bytes);

    ResetToken {
        hashed: hash_reset_token(&raw),
        raw,
        expires_at: Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
    }
}

pub fn hash_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
