//! # Classpulse Auth
//!
//! - [`claims`]: the JWT payload (`sub`, `role`, `iat`, `exp`)
//! - [`jwt`]: token issuance and verification
//! - [`reset_token`]: password-reset token generation and hashing

pub mod claims;
pub mod jwt;
pub mod reset_token;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
pub use reset_token::{ResetToken, generate_reset_token, hash_reset_token};
