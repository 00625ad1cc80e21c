//! Password hashing and verification.
//!
//! Hashing uses Argon2id with default parameters and a random salt from the
//! OS RNG; hashes are stored in PHC string format.

use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use docvault_core::error::{Result, VaultError};

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| VaultError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| VaultError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash checked when the login is unknown, so both failures cost the same.
static UNKNOWN_USER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown-user-placeholder").ok());

/// Runs a full verification for a login that does not exist.
///
/// Always returns false.
pub fn verify_unknown_user(password: &str) -> bool {
    if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    false
}
