//! Wi-Fi and GitHub credentials
//!
//! Kept in `/secrets.toml` on the badge filesystem, separate from the
//! runtime configuration so it can be edited without touching tuning.

use heapless::String;
use serde::Deserialize;

/// Longest SSID allowed by 802.11
pub const MAX_SSID_LEN: usize = 32;

/// Longest WPA2 passphrase
pub const MAX_PASSWORD_LEN: usize = 64;

/// Longest GitHub login
pub const MAX_HANDLE_LEN: usize = 39;

/// Room for classic and fine-grained personal access tokens
pub const MAX_TOKEN_LEN: usize = 128;

/// Credentials used by the badge app
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Secrets {
    pub wifi_ssid: Option<String<MAX_SSID_LEN>>,
    pub wifi_password: Option<String<MAX_PASSWORD_LEN>>,
    pub github_username: Option<String<MAX_HANDLE_LEN>>,
    pub github_token: Option<String<MAX_TOKEN_LEN>>,
}

impl Secrets {
    /// Network name, if set and non-empty
    pub fn ssid(&self) -> Option<&str> {
        non_empty(&self.wifi_ssid)
    }

    /// Passphrase; `None` joins an open network
    pub fn password(&self) -> Option<&str> {
        non_empty(&self.wifi_password)
    }

    /// GitHub handle, if set and non-empty
    pub fn handle(&self) -> Option<&str> {
        non_empty(&self.github_username)
    }

    /// API token, if set and non-empty
    pub fn token(&self) -> Option<&str> {
        non_empty(&self.github_token)
    }

    /// Returns true if the badge has enough to go online
    pub fn is_complete(&self) -> bool {
        self.ssid().is_some() && self.handle().is_some()
    }
}

fn non_empty<const N: usize>(value: &Option<String<N>>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
