use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

/// Well-formed argon2id hash at the default cost that no password matches.
/// Unknown-email logins verify against it so they cost the same as a wrong password.
pub const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(password_hash::Error),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(password_hash::Error),
    #[error("password verification failed: {0}")]
    Verify(password_hash::Error),
}

/// Hashes a plaintext password with argon2id and a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hash failed");
            PasswordError::Hash(e)
        })
}

/// `Ok(false)` means the password does not match; any other failure is an error.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(PasswordError::MalformedHash)?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!(error = %e, "argon2 verify failed");
            Err(PasswordError::Verify(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::Params;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("longenough1").expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("longenough1", &hash).expect("verify"));
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let hash = hash_password("correct-horse-battery-staple").expect("hash");
        assert!(!verify_password("wrong-password", &hash).expect("verify"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("longenough1").unwrap();
        let b = hash_password("longenough1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("anything", "not-a-valid-hash"),
            Err(PasswordError::MalformedHash(_))
        ));
    }

    #[test]
    fn dummy_hash_matches_nothing_at_default_cost() {
        assert!(!verify_password("dummy-password", DUMMY_HASH).expect("dummy hash parses"));
        assert!(!verify_password("", DUMMY_HASH).expect("dummy hash parses"));

        let parsed = PasswordHash::new(DUMMY_HASH).unwrap();
        let params = Params::try_from(&parsed).unwrap();
        let default = Params::default();
        assert_eq!(params.m_cost(), default.m_cost());
        assert_eq!(params.t_cost(), default.t_cost());
        assert_eq!(params.p_cost(), default.p_cost());
    }
}
