//! Credential Store: one-way password hashing and verification.
//!
//! Argon2id with the crate's default (OWASP recommended) parameters and a fresh
//! random salt per hash. Hashes are stored as PHC strings, so the parameters and
//! salt travel with the hash.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Hashes `plaintext` into a PHC string safe for storage.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError::Hash)
}

/// Checks `plaintext` against a stored PHC hash.
///
/// Never fails: a mismatch and an unparseable stored hash both yield `false`.
/// The digest comparison inside `argon2` is constant-time.
pub fn verify_password(hash: &str, plaintext: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Runs [`hash_password`] on the blocking pool; Argon2 is deliberately CPU heavy.
pub async fn hash_password_blocking(plaintext: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext))
        .await
        .unwrap_or_else(|join_error| {
            tracing::error!(error = ?join_error, "hashing task failed");
            Err(PasswordError::Hash(argon2::password_hash::Error::Crypto))
        })
}

/// Runs [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(hash: String, plaintext: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&hash, &plaintext))
        .await
        .unwrap_or_else(|join_error| {
            tracing::error!(error = ?join_error, "verification task failed");
            false
        })
}
