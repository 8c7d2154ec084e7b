//! crates/notes_core/src/password.rs
//!
//! Argon2 password hashing, shared by the auth flow.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::ports::{PortError, PortResult};

/// Hashes a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> PortResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored hash. A malformed stored
/// hash counts as a failed verification rather than an error; it can only
/// happen if the store was tampered with.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("Aa1!aaaa").unwrap();
        assert!(verify_password("Aa1!aaaa", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("Aa1!aaaa", "not-a-phc-string"));
    }
}
