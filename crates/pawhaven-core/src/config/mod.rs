//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate.
//! Each sub-module represents a logical configuration section, and every
//! field carries a default so an empty source yields a usable config.

pub mod account;
pub mod auth;
pub mod logging;
pub mod session;

use chrono::Duration;
use serde::{Deserialize, Serialize};

pub use self::account::AccountDefaults;
pub use self::auth::AuthConfig;
pub use self::logging::LoggingConfig;
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Longest duration any setting may express: 100 years, in minutes.
pub const MAX_DURATION_MINUTES: u64 = 100 * 365 * 24 * 60;

/// Convert a minute count to a [`Duration`], capped at [`MAX_DURATION_MINUTES`].
pub fn minutes(value: u64) -> Duration {
    const CAP: i64 = MAX_DURATION_MINUTES as i64;
    Duration::minutes(i64::try_from(value).map_or(CAP, |v| v.min(CAP)))
}

/// Reject a duration setting, given in `unit_minutes`-sized units, that
/// exceeds [`MAX_DURATION_MINUTES`].
pub(crate) fn check_duration(field: &str, value: u64, unit_minutes: u64) -> Result<(), AppError> {
    match value.checked_mul(unit_minutes) {
        Some(total) if total <= MAX_DURATION_MINUTES => Ok(()),
        _ => Err(AppError::configuration(format!(
            "{field} must not exceed {MAX_DURATION_MINUTES} minutes"
        ))),
    }
}

/// Root application configuration.
///
/// Top-level deserialization target for the merged configuration files
/// (default + environment overlay) and `PAWHAVEN__*` variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Credential policy settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Session lifecycle settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Defaults applied to newly created accounts.
    #[serde(default)]
    pub account: AccountDefaults,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and the environment.
    ///
    /// Merges `config/default` with an environment-specific overlay and
    /// environment variables prefixed with `PAWHAVEN__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PAWHAVEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        tracing::debug!(env = %env, "Configuration loaded");
        Ok(loaded)
    }

    /// Reject settings that would make the credential policy meaningless.
    pub fn validate(&self) -> Result<(), AppError> {
        self.auth.validate()?;
        self.session.validate()?;
        Ok(())
    }
}
