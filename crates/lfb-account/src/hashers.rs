//! Password hashing.
//!
//! Passwords are stored as Argon2id PHC strings. Hashing and verification
//! run on the blocking pool.

use lfb_core::{LfbError, LfbResult};

/// Prefix marking a password that can never match.
pub const UNUSABLE_PASSWORD_PREFIX: &str = "!";

fn join_error(e: &tokio::task::JoinError) -> LfbError {
    LfbError::Io(std::io::Error::other(format!("password task failed: {e}")))
}

/// Hashes a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns [`LfbError::Data`] if hashing fails.
pub async fn make_password(password: &str) -> LfbResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        use argon2::password_hash::{rand_core::OsRng, PasswordHasher as _, SaltString};
        use argon2::Argon2;

        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| LfbError::Data(format!("password hash error: {e}")))
    })
    .await
    .map_err(|e| join_error(&e))?
}

/// Checks a password against an encoded hash.
///
/// Unusable hashes never match.
///
/// # Errors
///
/// Returns [`LfbError::Data`] if `hash` is not a valid PHC string.
pub async fn check_password(password: &str, hash: &str) -> LfbResult<bool> {
    if !is_password_usable(hash) {
        return Ok(false);
    }
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || {
        use argon2::password_hash::{PasswordHash, PasswordVerifier as _};
        use argon2::Argon2;

        let parsed = PasswordHash::new(&hash)
            .map_err(|e| LfbError::Data(format!("invalid password hash: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| join_error(&e))?
}

/// Returns `true` if the encoded hash can match some password.
pub fn is_password_usable(hash: &str) -> bool {
    !hash.is_empty() && !hash.starts_with(UNUSABLE_PASSWORD_PREFIX)
}
