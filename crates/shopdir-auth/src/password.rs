//! Password hashing
//!
//! Argon2id with per-hash random salts. The output is a PHC string that
//! records algorithm and cost parameters, so verification keeps working
//! for hashes produced under older settings after the cost is tuned.
//!
//! Hashing is deliberately slow; async callers run it under
//! `tokio::task::spawn_blocking`.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::AuthError;

/// Cost parameters for new hashes
///
/// Defaults match the argon2 crate's recommended interactive settings.
#[derive(Debug, Clone)]
pub struct HashingParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Credential hasher used for account passwords
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { argon2: Argon2::default() }
    }
}

impl PasswordHasher {
    /// Create a hasher with explicit cost parameters
    pub fn new(params: HashingParams) -> Result<Self, AuthError> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| AuthError::InvalidInput(format!("Invalid hashing parameters: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a raw password into a PHC string
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.is_empty() {
            return Err(AuthError::InvalidInput("Password must not be empty".to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify a raw password against a stored PHC string
    ///
    /// A mismatch is `Ok(false)`, not an error. The comparison itself is
    /// the argon2 primitive's; there is no manual byte comparison here.
    /// An unparseable stored hash is an error: it means the store is
    /// corrupt, not that the password is wrong.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| AuthError::PasswordHash(format!("Stored hash unparseable: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::PasswordHash(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hasher = PasswordHasher::default();
        let hash = hasher.hash("correct horse battery staple").unwrap();
        assert!(hasher.verify("correct horse battery staple", &hash).unwrap());
    }

    #[test]
    fn test_wrong_password_is_false_not_error() {
        let hasher = PasswordHasher::default();
        let hash = hasher.hash("right").unwrap();
        assert!(!hasher.verify("wrong", &hash).unwrap());
        assert!(!hasher.verify("", &hash).unwrap());
    }

    #[test]
    fn test_empty_password_rejected() {
        let hasher = PasswordHasher::default();
        let err = hasher.hash("").unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let hasher = PasswordHasher::default();
        let first = hasher.hash("hunter2").unwrap();
        let second = hasher.hash("hunter2").unwrap();
        assert_ne!(first, second);
        assert!(hasher.verify("hunter2", &first).unwrap());
        assert!(hasher.verify("hunter2", &second).unwrap());
    }

    #[test]
    fn test_output_is_self_describing() {
        let hasher =
            PasswordHasher::new(HashingParams { memory_kib: 1024, iterations: 3, parallelism: 1 })
                .unwrap();
        let hash = hasher.hash("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=1024"));
        assert!(hash.contains("t=3"));

        // A hasher with different settings still verifies it, reading the
        // parameters from the hash itself.
        assert!(PasswordHasher::default().verify("hunter2", &hash).unwrap());
    }

    #[test]
    fn test_malformed_stored_hash_is_error() {
        let hasher = PasswordHasher::default();
        let err = hasher.verify("anything", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, AuthError::PasswordHash(_)));
    }

    #[test]
    fn test_invalid_params_rejected() {
        // Parallelism of zero is outside argon2's accepted range
        let result =
            PasswordHasher::new(HashingParams { memory_kib: 1024, iterations: 2, parallelism: 0 });
        assert!(result.is_err());
    }
}
