//! Password policy enforcement for new passwords.

use pawhaven_core::config::AuthConfig;

use crate::error::{AuthError, AuthResult};

/// Validates password strength against configured policies.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length, in characters.
    min_length: usize,
    /// Minimum zxcvbn score.
    min_strength: u8,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
            min_strength: config.password_min_strength,
        }
    }

    /// Validates a password against all configured policies.
    ///
    /// `user_inputs` (email, names) are fed to the entropy estimator so a
    /// password built from them scores low.
    pub fn validate(&self, password: &str, user_inputs: &[&str]) -> AuthResult<()> {
        if password.chars().count() < self.min_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(AuthError::Validation(
                "Password must contain at least one uppercase letter".into(),
            ));
        }

        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(AuthError::Validation(
                "Password must contain at least one lowercase letter".into(),
            ));
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AuthError::Validation(
                "Password must contain at least one digit".into(),
            ));
        }

        let estimate = zxcvbn::zxcvbn(password, user_inputs);
        if (estimate.score() as u8) < self.min_strength {
            return Err(AuthError::Validation(
                "Password is too weak. Please use a stronger password with more entropy.".into(),
            ));
        }

        Ok(())
    }
}

impl Default for PasswordValidator {
    fn default() -> Self {
        Self::new(&AuthConfig::default())
    }
}
