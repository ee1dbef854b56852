//! Account kinds and the session namespace each kind authenticates under.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session namespace for regular shelter users.
pub const USERS_ENTITY: &str = "users";
/// Session namespace for shelter staff administrators.
pub const ADMINS_ENTITY: &str = "admins";
/// Session namespace for vendor accounts.
pub const VENDORS_ENTITY: &str = "vendors";

/// Role label carried by regular user accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Adopter or volunteer.
    User,
    /// Shelter administrator with a user account.
    Admin,
    /// Platform operator.
    SuperAdmin,
}

/// What kind of principal an account belongs to.
///
/// The shared credential state lives in `AccountCore`; this tag carries
/// only what differs per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountKind {
    /// A regular application user.
    User {
        /// Optional role label.
        #[serde(default)]
        role: Option<UserRole>,
    },
    /// A back-office administrator.
    Admin,
    /// A vendor (supplier, partner clinic).
    Vendor {
        /// Organisation the vendor represents.
        #[serde(default)]
        organization: Option<String>,
    },
}

impl AccountKind {
    /// A plain user with no role label.
    pub fn user() -> Self {
        Self::User { role: None }
    }

    /// The session namespace this kind authenticates under.
    pub fn auth_entity(&self) -> &'static str {
        match self {
            Self::User { .. } => USERS_ENTITY,
            Self::Admin => ADMINS_ENTITY,
            Self::Vendor { .. } => VENDORS_ENTITY,
        }
    }
}

impl Default for AccountKind {
    fn default() -> Self {
        Self::user()
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.auth_entity())
    }
}
