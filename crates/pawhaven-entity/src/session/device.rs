//! Client device metadata recorded on sessions.
//!
//! Informational only: nothing here takes part in a security decision.

use serde::{Deserialize, Serialize};

const MAX_IP_LEN: usize = 45;
const MAX_USER_AGENT_LEN: usize = 1000;
const MAX_DEVICE_NAME_LEN: usize = 100;
const MAX_DEVICE_TYPE_LEN: usize = 50;

/// Device and network details of the client that owns a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Raw User-Agent header.
    pub user_agent: Option<String>,
    /// Friendly device name, e.g. "Chrome on Windows".
    pub device_name: Option<String>,
    /// Device class, e.g. "mobile", "desktop", "tablet".
    pub device_type: Option<String>,
}

impl DeviceInfo {
    /// Build device info from request metadata, clamping field lengths.
    pub fn new(ip_address: Option<&str>, user_agent: Option<&str>) -> Self {
        Self {
            ip_address: clamp(ip_address, MAX_IP_LEN),
            user_agent: clamp(user_agent, MAX_USER_AGENT_LEN),
            device_name: None,
            device_type: None,
        }
    }

    /// Attach a friendly device name and class.
    pub fn with_device(mut self, name: Option<&str>, device_type: Option<&str>) -> Self {
        self.device_name = clamp(name, MAX_DEVICE_NAME_LEN);
        self.device_type = clamp(device_type, MAX_DEVICE_TYPE_LEN);
        self
    }
}

fn clamp(value: Option<&str>, max_chars: usize) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.chars().take(max_chars).collect())
}
