// Account password hashing using Argon2id
// Decision: Default Argon2 parameters, PHC string format stored as-is

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a plaintext password into a PHC string
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(hash.to_string())
}

/// Check a plaintext password against a stored PHC string.
/// A malformed stored hash is an error, a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("Stored password hash is malformed: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_account_password_round_trip() {
        let hash = hash_password("keesun").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("keesun", &hash).unwrap());
        assert!(!verify_password("Keesun", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let first = hash_password("pass").unwrap();
        let second = hash_password("pass").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("pass", "plaintext-pass").is_err());
    }
}
