//! Credential policy configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{check_duration, minutes};
use crate::error::AppError;

/// Lockout, one-time secret, and token-signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for access-token signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Issuer claim stamped into every access token.
    #[serde(default = "default_jwt_issuer")]
    pub jwt_issuer: String,
    /// Failed login attempts that trigger a lockout.
    #[serde(default = "default_max_attempts")]
    pub max_login_attempts: u32,
    /// Account lockout duration in minutes.
    #[serde(default = "default_lockout")]
    pub lockout_duration_minutes: u64,
    /// Length of email verification codes.
    #[serde(default = "default_code_length")]
    pub verification_code_length: usize,
    /// Verification code lifetime in minutes.
    #[serde(default = "default_code_ttl")]
    pub verification_code_ttl_minutes: u64,
    /// Length of password-reset tokens.
    #[serde(default = "default_reset_length")]
    pub reset_token_length: usize,
    /// Password-reset token lifetime in minutes.
    #[serde(default = "default_reset_ttl")]
    pub reset_token_ttl_minutes: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Minimum zxcvbn score (0-4) accepted for new passwords.
    #[serde(default = "default_password_strength")]
    pub password_min_strength: u8,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_issuer: default_jwt_issuer(),
            max_login_attempts: default_max_attempts(),
            lockout_duration_minutes: default_lockout(),
            verification_code_length: default_code_length(),
            verification_code_ttl_minutes: default_code_ttl(),
            reset_token_length: default_reset_length(),
            reset_token_ttl_minutes: default_reset_ttl(),
            password_min_length: default_password_min(),
            password_min_strength: default_password_strength(),
        }
    }
}

impl AuthConfig {
    /// Check the section for values no policy can work with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt_secret.is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        if self.max_login_attempts == 0 {
            return Err(AppError::configuration(
                "auth.max_login_attempts must be at least 1",
            ));
        }
        if self.verification_code_length == 0 || self.reset_token_length == 0 {
            return Err(AppError::configuration(
                "auth secret lengths must be at least 1",
            ));
        }
        check_duration(
            "auth.lockout_duration_minutes",
            self.lockout_duration_minutes,
            1,
        )?;
        check_duration(
            "auth.verification_code_ttl_minutes",
            self.verification_code_ttl_minutes,
            1,
        )?;
        check_duration("auth.reset_token_ttl_minutes", self.reset_token_ttl_minutes, 1)?;
        if self.password_min_strength > 4 {
            return Err(AppError::configuration(
                "auth.password_min_strength must be between 0 and 4",
            ));
        }
        Ok(())
    }

    /// How long a lockout lasts.
    pub fn lockout_duration(&self) -> Duration {
        minutes(self.lockout_duration_minutes)
    }

    /// How long a verification code stays usable.
    pub fn verification_code_ttl(&self) -> Duration {
        minutes(self.verification_code_ttl_minutes)
    }

    /// How long a password-reset token stays usable.
    pub fn reset_token_ttl(&self) -> Duration {
        minutes(self.reset_token_ttl_minutes)
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_jwt_issuer() -> String {
    "pawhaven".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_lockout() -> u64 {
    15
}

fn default_code_length() -> usize {
    6
}

fn default_code_ttl() -> u64 {
    15
}

fn default_reset_length() -> usize {
    32
}

fn default_reset_ttl() -> u64 {
    60
}

fn default_password_min() -> usize {
    8
}

fn default_password_strength() -> u8 {
    3
}
