use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::{debug, error};

/// Longest accepted plaintext, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("password exceeds {MAX_PASSWORD_BYTES} bytes")]
    TooLong,
    #[error("argon2: {0}")]
    Argon2(String),
}

pub fn hash_password(plain: &str) -> Result<String, HashError> {
    if plain.len() > MAX_PASSWORD_BYTES {
        return Err(HashError::TooLong);
    }
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            HashError::Argon2(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Never fails: a malformed hash is simply a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "stored hash is not a PHC string");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}
