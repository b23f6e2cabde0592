//! Password hashing — argon2id with PHC-format strings.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

use crate::service::AuthError;

/// Hash a raw password with argon2id and a random salt.
///
/// Returns the PHC string (algorithm, parameters and salt included).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("password hashing failed: {}", e)))
}

/// Verify a raw password against a stored PHC hash.
///
/// A malformed stored hash verifies as false — it never panics and never
/// reveals to the caller what was wrong.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
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
    fn hash_and_verify() {
        let hash = hash_password("correct-pw").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-pw", &hash));
        assert!(!verify_password("wrong-pw", &hash));
    }

    #[test]
    fn salts_differ() {
        let h1 = hash_password("same").unwrap();
        let h2 = hash_password("same").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn malformed_hash_is_false_not_panic() {
        assert!(!verify_password("anything", "not-a-phc-hash"));
        assert!(!verify_password("anything", ""));
    }
}
