//! Password Service
//!
//! Argon2id hashing and verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{GatherError, Result};

#[derive(Default)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a password into a PHC string.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| GatherError::internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored PHC hash.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| GatherError::internal(format!("Malformed password hash: {}", e)))?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let svc = PasswordService::new();
        let hash = svc.hash_password("correct horse").unwrap();
        assert!(svc.verify_password("correct horse", &hash).unwrap());
        assert!(!svc.verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let svc = PasswordService::new();
        let a = svc.hash_password("secret").unwrap();
        let b = svc.hash_password("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let svc = PasswordService::new();
        assert!(svc.verify_password("secret", "not-a-phc-string").is_err());
    }
}
