//! Session lifecycle configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{check_duration, minutes};
use crate::error::AppError;

/// Session token lifetimes and lifecycle behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: u64,
    /// Refresh token lifetime in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_days: u64,
    /// Hard session lifetime in hours. When unset the session row expires
    /// together with its longest-lived token.
    #[serde(default)]
    pub absolute_timeout_hours: Option<u64>,
    /// Minutes before access-token expiry at which clients should refresh.
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold_minutes: u64,
    /// Whether a refresh also replaces the refresh token.
    #[serde(default = "default_true")]
    pub rotate_refresh_tokens: bool,
    /// Length of opaque refresh tokens.
    #[serde(default = "default_refresh_length")]
    pub refresh_token_length: usize,
    /// How long to wait for the per-user session lock, in milliseconds.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
    /// Interval for the expired-session sweep in minutes.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_days: default_refresh_ttl(),
            absolute_timeout_hours: None,
            refresh_threshold_minutes: default_refresh_threshold(),
            rotate_refresh_tokens: default_true(),
            refresh_token_length: default_refresh_length(),
            lock_timeout_ms: default_lock_timeout(),
            cleanup_interval_minutes: default_cleanup_interval(),
        }
    }
}

impl SessionConfig {
    /// Check the section for values no session could satisfy.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.access_token_ttl_minutes == 0 {
            return Err(AppError::configuration(
                "session.access_token_ttl_minutes must be at least 1",
            ));
        }
        if self.refresh_token_length == 0 {
            return Err(AppError::configuration(
                "session.refresh_token_length must be at least 1",
            ));
        }
        if self.cleanup_interval_minutes == 0 {
            return Err(AppError::configuration(
                "session.cleanup_interval_minutes must be at least 1",
            ));
        }
        check_duration("session.access_token_ttl_minutes", self.access_token_ttl_minutes, 1)?;
        check_duration("session.refresh_token_ttl_days", self.refresh_token_ttl_days, 24 * 60)?;
        check_duration(
            "session.refresh_threshold_minutes",
            self.refresh_threshold_minutes,
            1,
        )?;
        check_duration("session.cleanup_interval_minutes", self.cleanup_interval_minutes, 1)?;
        if let Some(hours) = self.absolute_timeout_hours {
            check_duration("session.absolute_timeout_hours", hours, 60)?;
        }
        Ok(())
    }

    /// Access token lifetime.
    pub fn access_token_ttl(&self) -> Duration {
        minutes(self.access_token_ttl_minutes)
    }

    /// Refresh token lifetime.
    pub fn refresh_token_ttl(&self) -> Duration {
        minutes(self.refresh_token_ttl_days.saturating_mul(24 * 60))
    }

    /// Hard session lifetime, when configured.
    pub fn absolute_timeout(&self) -> Option<Duration> {
        self.absolute_timeout_hours
            .map(|hours| minutes(hours.saturating_mul(60)))
    }

    /// Advisory refresh window before access-token expiry.
    pub fn refresh_threshold(&self) -> Duration {
        minutes(self.refresh_threshold_minutes)
    }
}

fn default_access_ttl() -> u64 {
    60
}

fn default_refresh_ttl() -> u64 {
    7
}

fn default_refresh_threshold() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

fn default_refresh_length() -> usize {
    48
}

fn default_lock_timeout() -> u64 {
    2000
}

fn default_cleanup_interval() -> u64 {
    15
}
