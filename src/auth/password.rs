use crate::types::{AppError, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hashes a password using Argon2id with a fresh random salt.
///
/// Returns a PHC-formatted hash string. Hasher failures are `Internal`.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verifies a password against a PHC hash.
///
/// Mismatches and unparseable digests both yield `false`.
pub fn verify_password(password: &str, digest: &str) -> bool {
    let parsed = match PasswordHash::new(digest) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "stored password digest is not a valid PHC string");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";

        let hash = hash_password(password).expect("should hash password");

        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2id"), "hash should be in PHC format");
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let first = hash_password("pw1").expect("should hash");
        let second = hash_password("pw1").expect("should hash");

        assert_ne!(first, second, "salts should differ between hashes");
    }

    #[test]
    fn test_password_verification_success() {
        let hash = hash_password("secure_password_456").expect("should hash password");

        assert!(verify_password("secure_password_456", &hash));
    }

    #[test]
    fn test_password_verification_failure() {
        let hash = hash_password("correct_password").expect("should hash password");

        assert!(!verify_password("wrong_password", &hash));
    }

    #[test]
    fn test_garbage_digest_does_not_verify() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }
}
