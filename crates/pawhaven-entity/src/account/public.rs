//! Views of an account that may leave the authentication boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pawhaven_core::types::AccountId;

use super::kind::AccountKind;
use super::model::Account;
use super::status::AccountStatus;

/// An account stripped of credentials, secrets, lock state, and
/// network metadata.
///
/// Login tracking (`login_count`, `last_login_at`) is excluded as well;
/// owners read it through [`LoginActivity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicAccount {
    /// Account identifier.
    pub id: AccountId,
    /// Email address.
    pub email: String,
    /// Login name.
    pub username: Option<String>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Preferred display name.
    pub display_name: String,
    /// Administrative status.
    pub status: AccountStatus,
    /// Whether the email address is confirmed.
    pub is_email_verified: bool,
    /// Kind of principal.
    #[serde(flatten)]
    pub kind: AccountKind,
    /// Session namespace of the account kind.
    pub auth_entity: String,
    /// Contact phone.
    pub phone: Option<String>,
    /// Timezone.
    pub timezone: String,
    /// Locale.
    pub locale: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for PublicAccount {
    fn from(account: &Account) -> Self {
        let core = &account.core;
        Self {
            id: core.id,
            email: core.email.clone(),
            username: core.username.clone(),
            first_name: core.first_name.clone(),
            last_name: core.last_name.clone(),
            display_name: core.display_name(),
            status: core.status,
            is_email_verified: core.is_email_verified,
            kind: account.kind.clone(),
            auth_entity: account.auth_entity().to_string(),
            phone: core.phone.clone(),
            timezone: core.timezone.clone(),
            locale: core.locale.clone(),
            created_at: core.created_at,
            updated_at: core.updated_at,
        }
    }
}

/// Login tracking visible to the account owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginActivity {
    /// Number of successful logins.
    pub login_count: u64,
    /// Last successful login.
    pub last_login_at: Option<DateTime<Utc>>,
}
