//! Defaults applied when an account is created.

use serde::{Deserialize, Serialize};

/// Locale defaults handed to the account layer at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDefaults {
    /// IANA timezone assigned when registration does not provide one.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Locale tag assigned when registration does not provide one.
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for AccountDefaults {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            locale: default_locale(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}
