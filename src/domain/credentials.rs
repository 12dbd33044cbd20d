//! Password credentials stored as Argon2id PHC strings.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct CredentialError(String);

impl From<argon2::password_hash::Error> for CredentialError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self(err.to_string())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    phc: String,
}

impl PasswordHash {
    /// Hash `password` with Argon2id under a fresh random salt.
    pub fn derive(password: &str) -> Result<Self, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string();
        Ok(Self { phc })
    }

    /// A credential no known password authenticates against.
    pub fn unusable() -> Result<Self, CredentialError> {
        let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        Self::derive(&secret)
    }

    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self { phc: phc.into() }
    }

    pub fn as_phc(&self) -> &str {
        &self.phc
    }

    /// Constant-time check of `password`; a malformed stored hash never verifies.
    pub fn verify(&self, password: &str) -> bool {
        let Ok(parsed) = PhcHash::new(&self.phc) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let algorithm = PhcHash::new(&self.phc)
            .map(|parsed| parsed.algorithm.to_string())
            .unwrap_or_else(|_| "<malformed>".to_string());
        f.debug_struct("PasswordHash")
            .field("algorithm", &algorithm)
            .field("hash", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_hash_verifies_only_its_password() {
        let hash = PasswordHash::derive("hunter2").expect("hash");
        assert!(hash.verify("hunter2"));
        assert!(!hash.verify("hunter3"));
        assert!(!hash.verify(""));
    }

    #[test]
    fn hashes_are_argon2id_phc_strings() {
        let hash = PasswordHash::derive("secret").expect("hash");
        assert!(hash.as_phc().starts_with("$argon2id$"));

        let restored = PasswordHash::from_phc(hash.as_phc());
        assert!(restored.verify("secret"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let first = PasswordHash::derive("secret").expect("hash");
        let second = PasswordHash::derive("secret").expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn unusable_hash_rejects_previous_password() {
        let hash = PasswordHash::unusable().expect("hash");
        assert!(!hash.verify("secret"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let hash = PasswordHash::from_phc("not a phc string");
        assert!(!hash.verify("not a phc string"));
        assert!(format!("{hash:?}").contains("<malformed>"));
    }

    #[test]
    fn debug_output_redacts_hash() {
        let hash = PasswordHash::derive("secret").expect("hash");
        let rendered = format!("{hash:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(hash.as_phc()));
    }
}
