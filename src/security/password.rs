// [library] Argon2 - memory-hard password hashing
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use std::sync::OnceLock;

use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashError(argon2::password_hash::Error),
    #[error("Password must be at least 8 characters")]
    TooShort,
}

impl From<argon2::password_hash::Error> for PasswordError {
    fn from(err: argon2::password_hash::Error) -> Self {
        PasswordError::HashError(err)
    }
}

// [security] Length is counted in characters, not bytes
pub fn check_password_policy(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}

// [security] Argon2id with a fresh random salt; the PHC string embeds salt and parameters
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

// [security] Constant-time verification against a stored PHC string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::HashError(e)),
    }
}

// [security] Hash of a random secret nobody knows, created on first use
fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| hash_password(&uuid::Uuid::new_v4().to_string()).ok())
        .as_deref()
}

/// Runs a full verification for a login whose account does not exist, so
/// the response time matches a wrong password. Always `false`.
pub fn verify_unknown_account(password: &str) -> bool {
    match dummy_hash() {
        Some(hash) => matches!(verify_password(password, hash), Ok(true)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse battery").expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("correct horse", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("same_password", &hash1).unwrap());
        assert!(verify_password("same_password", &hash2).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        for invalid_hash in ["", "plain_text_password", "$argon2id$", "$2b$10$bcrypt"] {
            assert!(
                verify_password("whatever", invalid_hash).is_err(),
                "Should reject invalid hash format: {}",
                invalid_hash
            );
        }
    }

    #[test]
    fn test_unknown_account_check_runs_argon2() {
        let hash = dummy_hash().expect("dummy hash");
        assert!(hash.starts_with("$argon2id$"));
        assert_eq!(dummy_hash(), Some(hash));

        assert!(!verify_unknown_account("correct horse battery"));
        assert!(!verify_unknown_account(""));
    }

    #[test]
    fn test_password_policy() {
        assert!(check_password_policy("longenough").is_ok());
        assert!(matches!(
            check_password_policy("short"),
            Err(PasswordError::TooShort)
        ));
        // [security] 8 multi-byte characters pass even though byte length differs
        assert!(check_password_policy("пароль🔒密").is_ok());
    }
}
