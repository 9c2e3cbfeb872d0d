//! Password hashing helpers for the login step that precedes `create_token`.

use crate::error::VerifierError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash `password` into an Argon2id PHC string with a random salt.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String, VerifierError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| VerifierError::PasswordHash(e.to_string()))
}

/// Check `password` against a PHC hash. `Ok(false)` on mismatch.
///
/// # Errors
///
/// Returns an error if `hash` is not a valid PHC string.
pub fn verify_password(hash: &str, password: &str) -> Result<bool, VerifierError> {
    let parsed = PasswordHash::new(hash).map_err(|e| VerifierError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
