//! Argon2id PIN hashing.
//!
//! Vault PINs are short numeric strings, so the work factor matters more
//! than for full passwords.  Default Argon2id parameters (19 MiB, t=2) are
//! adequate for an interactive local vault; the hash is a self-describing
//! PHC string, stored opaque in the vault row.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::CryptoError;

/// Hash a PIN into a PHC string (`$argon2id$v=19$...`).
pub fn hash_pin(pin: &str) -> Result<String, CryptoError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map_err(|e| CryptoError::PinHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a PIN against a stored PHC string.  An unparseable hash counts as
/// a non-match rather than an error — the login path treats it exactly like
/// a wrong PIN.
pub fn verify_pin(pin: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(pin.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
