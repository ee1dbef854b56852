//! Account entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use pawhaven_core::AppError;
use pawhaven_core::config::AccountDefaults;
use pawhaven_core::types::AccountId;

use super::kind::AccountKind;
use super::public::{LoginActivity, PublicAccount};
use super::status::AccountStatus;
use crate::secret::ExpiringSecret;
use crate::session::SessionKey;

/// Longest stored client IP (fits an IPv6 literal with zone).
const MAX_IP_LEN: usize = 45;
/// Longest stored user-agent string.
const MAX_USER_AGENT_LEN: usize = 1000;

/// Credential and profile state shared by every kind of account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCore {
    /// Unique account identifier.
    pub id: AccountId,
    /// Normalised (lowercase, trimmed) email address.
    pub email: String,
    /// Optional normalised login name.
    pub username: Option<String>,
    /// Password hash produced by the hashing collaborator.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Administrative status.
    pub status: AccountStatus,
    /// Whether the email address has been confirmed.
    pub is_email_verified: bool,
    /// Pending email verification code, if one was issued.
    pub verification: Option<ExpiringSecret>,
    /// Pending password-reset token, if one was issued.
    pub password_reset: Option<ExpiringSecret>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// IANA timezone.
    pub timezone: String,
    /// Locale tag.
    pub locale: String,
    /// Consecutive failed login attempts.
    pub login_attempts: u32,
    /// Lockout end, if a lockout was ever applied.
    pub locked_until: Option<DateTime<Utc>>,
    /// Number of successful logins.
    pub login_count: u64,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Client IP of the last successful login.
    pub last_login_ip: Option<String>,
    /// User agent of the last successful login.
    pub last_user_agent: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last modified.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion time. Terminal once set.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AccountCore {
    /// "First Last", or empty when either part is missing.
    pub fn full_name(&self) -> String {
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return String::new();
        }
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Uppercase initials, or empty when either name part is missing.
    pub fn initials(&self) -> String {
        match (self.first_name.chars().next(), self.last_name.chars().next()) {
            (Some(first), Some(last)) => first.to_uppercase().chain(last.to_uppercase()).collect(),
            _ => String::new(),
        }
    }

    /// Username if set, else the full name, else a generic label.
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return username.to_string();
        }
        let full = self.full_name();
        if full.is_empty() { "User".to_string() } else { full }
    }
}

/// An account: shared core plus the kind-specific tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Shared credential and profile state.
    #[serde(flatten)]
    pub core: AccountCore,
    /// Kind of principal.
    #[serde(flatten)]
    pub kind: AccountKind,
}

impl Account {
    /// Build a new active account from registration input.
    ///
    /// Input is normalised here; nothing is normalised implicitly later.
    pub fn new(
        input: NewAccount,
        password_hash: String,
        defaults: &AccountDefaults,
        now: DateTime<Utc>,
    ) -> Self {
        let input = input.normalized();
        let core = AccountCore {
            id: AccountId::new(),
            email: input.email,
            username: input.username,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            status: AccountStatus::Active,
            is_email_verified: false,
            verification: None,
            password_reset: None,
            phone: input.phone,
            timezone: input.timezone.unwrap_or_else(|| defaults.timezone.clone()),
            locale: input.locale.unwrap_or_else(|| defaults.locale.clone()),
            login_attempts: 0,
            locked_until: None,
            login_count: 0,
            last_login_at: None,
            last_login_ip: None,
            last_user_agent: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        Self {
            core,
            kind: input.kind,
        }
    }

    /// Account identifier.
    pub fn id(&self) -> AccountId {
        self.core.id
    }

    /// Normalised email.
    pub fn email(&self) -> &str {
        &self.core.email
    }

    /// Session namespace for this account's kind.
    pub fn auth_entity(&self) -> &'static str {
        self.kind.auth_entity()
    }

    /// Composite key under which this account's sessions are stored.
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.core.id, self.auth_entity())
    }

    /// Whether the account has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.core.deleted_at.is_some()
    }

    /// Active status and not soft-deleted. Lock state is not considered.
    pub fn is_active(&self) -> bool {
        self.core.status.can_login() && !self.is_deleted()
    }

    /// Replace the attempt counter and lock end together.
    pub fn apply_login_attempt(
        &mut self,
        attempts: u32,
        locked_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) {
        self.core.login_attempts = attempts;
        self.core.locked_until = locked_until;
        self.core.updated_at = now;
    }

    /// Record a successful login: clear lock state and update tracking.
    pub fn apply_login_success(
        &mut self,
        now: DateTime<Utc>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.core.login_attempts = 0;
        self.core.locked_until = None;
        self.core.login_count += 1;
        self.core.last_login_at = Some(now);
        self.core.last_login_ip = ip_address.map(|ip| truncate(ip, MAX_IP_LEN));
        self.core.last_user_agent = user_agent.map(|ua| truncate(ua, MAX_USER_AGENT_LEN));
        self.core.updated_at = now;
    }

    /// Store a pending verification code, replacing any earlier one.
    pub fn set_verification(&mut self, secret: ExpiringSecret, now: DateTime<Utc>) {
        self.core.verification = Some(secret);
        self.core.updated_at = now;
    }

    /// Drop the pending verification code.
    pub fn clear_verification(&mut self, now: DateTime<Utc>) {
        self.core.verification = None;
        self.core.updated_at = now;
    }

    /// Store a pending password-reset token, replacing any earlier one.
    pub fn set_password_reset(&mut self, secret: ExpiringSecret, now: DateTime<Utc>) {
        self.core.password_reset = Some(secret);
        self.core.updated_at = now;
    }

    /// Drop the pending password-reset token.
    pub fn clear_password_reset(&mut self, now: DateTime<Utc>) {
        self.core.password_reset = None;
        self.core.updated_at = now;
    }

    /// Mark the email address as confirmed.
    pub fn mark_email_verified(&mut self, now: DateTime<Utc>) {
        self.core.is_email_verified = true;
        self.core.updated_at = now;
    }

    /// Replace the stored password hash.
    pub fn set_password_hash(&mut self, password_hash: String, now: DateTime<Utc>) {
        self.core.password_hash = password_hash;
        self.core.updated_at = now;
    }

    /// Soft-delete the account. Repeated calls keep the first timestamp.
    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        if self.core.deleted_at.is_none() {
            self.core.deleted_at = Some(now);
            self.core.updated_at = now;
        }
    }

    /// The view safe to expose outside the authentication boundary.
    pub fn to_public_view(&self) -> PublicAccount {
        PublicAccount::from(self)
    }

    /// Login tracking data, for the account owner only.
    pub fn login_activity(&self) -> LoginActivity {
        LoginActivity {
            login_count: self.core.login_count,
            last_login_at: self.core.last_login_at,
        }
    }
}

/// Registration input for a new account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAccount {
    /// Email address.
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    /// Optional login name (3-20 characters: letters, digits, underscore).
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: Option<String>,
    /// Given name.
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    /// Family name.
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    /// Contact phone number.
    #[validate(length(min = 10, max = 20, message = "Phone number is not valid"))]
    pub phone: Option<String>,
    /// Kind of principal being registered.
    #[serde(default)]
    pub kind: AccountKind,
    /// Timezone override.
    pub timezone: Option<String>,
    /// Locale override.
    pub locale: Option<String>,
}

impl NewAccount {
    /// Convenience constructor for a plain user.
    pub fn user(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: None,
            kind: AccountKind::user(),
            timezone: None,
            locale: None,
        }
    }

    /// Lowercase and trim identifiers, trim names; blank optionals become `None`.
    pub fn normalized(self) -> Self {
        Self {
            email: normalize_email(&self.email),
            username: non_blank(self.username.map(|u| u.trim().to_lowercase())),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: non_blank(self.phone.map(|p| p.trim().to_string())),
            kind: self.kind,
            timezone: non_blank(self.timezone.map(|t| t.trim().to_string())),
            locale: non_blank(self.locale.map(|l| l.trim().to_string())),
        }
    }

    /// Run field validation plus the username character rule.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|e| AppError::validation(format!("Invalid registration: {e}")))?;

        if let Some(username) = &self.username {
            if !username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(AppError::validation(
                    "Username may only contain letters, digits and underscores",
                ));
            }
        }
        Ok(())
    }
}

/// Lowercase and trim an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
