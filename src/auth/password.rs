use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
};
use rand::thread_rng;

use super::AuthError;

/// Password storage primitive used by registration and login.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError>;

    /// A malformed stored hash verifies as false.
    fn verify(&self, hash: &str, plaintext: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut thread_rng());
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AuthError::Internal(format!("password hashing failed: {err}")))
    }

    fn verify(&self, hash: &str, plaintext: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            tracing::warn!("stored password hash could not be parsed");
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::{Argon2PasswordHasher, PasswordHasher};

    #[test]
    fn hash_then_verify() {
        let hasher = Argon2PasswordHasher;
        let hash = hasher.hash("correct horse").expect("hash should succeed");

        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify(&hash, "correct horse"));
        assert!(!hasher.verify(&hash, "wrong horse"));
    }

    #[test]
    fn same_password_hashes_differently() {
        let hasher = Argon2PasswordHasher;
        let first = hasher.hash("password123").expect("hash should succeed");
        let second = hasher.hash("password123").expect("hash should succeed");

        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!Argon2PasswordHasher.verify("not-a-phc-string", "password123"));
    }
}
