//! Argon2id password hashing and verification.

use std::fmt::Debug;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use pawhaven_core::error::AppError;

/// Password hash collaborator used by login, registration and reset.
///
/// Implementations must be deterministic in `verify` and must return
/// `Ok(false)` rather than an error for a plain mismatch.
pub trait PasswordHashing: Send + Sync + Debug + 'static {
    /// Hashes a plaintext password.
    fn hash(&self, password: &str) -> Result<String, AppError>;

    /// Checks a plaintext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError>;
}

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a new password hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored Argon2id hash.
    ///
    /// Returns `Ok(true)` if the password matches, `Ok(false)` if not.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHashing for PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, AppError> {
        self.hash_password(password)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        self.verify_password(password, hash)
    }
}
