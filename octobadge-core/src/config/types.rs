//! Runtime configuration type definitions
//!
//! These types are loaded from `/config.toml` at boot. Every field has a
//! default, so a missing file or a file that only overrides one value are
//! both valid.

use serde::Deserialize;

use crate::app::{path_from, AppPath};
use crate::fetch::MAX_CHUNK_SIZE;

use super::ConfigError;

/// App launched on a normal boot
pub const DEFAULT_APP: &str = "/system/apps/badge";

/// App launched after a HOME reset, and whenever an app stops
pub const CHOOSER_APP: &str = "/system/apps/menu";

/// Default per-task fetch deadline
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 25_000;

/// Default bytes transferred per fetch resume
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Default time allowed for the Wi-Fi link to come up
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 60_000;

/// Default time the reset path waits for the running app to wind down
pub const DEFAULT_EXIT_GRACE_MS: u64 = 100;

/// Top-level runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct RuntimeConfig {
    /// App selection
    pub apps: AppsConfig,
    /// Resumable fetch tuning
    pub fetch: FetchConfig,
    /// Wi-Fi link
    pub network: NetworkConfig,
    /// HOME reset path
    pub reset: ResetConfig,
}

/// App selection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct AppsConfig {
    /// Launched on a normal boot
    pub default: AppPath,
    /// Launched after a HOME reset or when an app stops
    pub chooser: AppPath,
}

impl Default for AppsConfig {
    fn default() -> Self {
        Self {
            default: path_from(DEFAULT_APP),
            chooser: path_from(CHOOSER_APP),
        }
    }
}

/// Resumable fetch tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct FetchConfig {
    /// Deadline measured from task creation
    pub timeout_ms: u64,
    /// Bytes transferred per resume (clamped to 1..=1024)
    pub chunk_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl FetchConfig {
    /// Chunk size with the transfer buffer bounds applied
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.clamp(1, MAX_CHUNK_SIZE)
    }
}

/// Wi-Fi link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct NetworkConfig {
    pub connect_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

/// HOME reset path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct ResetConfig {
    /// Upper bound on waiting for the running app to observe the exit request
    pub exit_grace_ms: u64,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            exit_grace_ms: DEFAULT_EXIT_GRACE_MS,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(text).map_err(|_| ConfigError::TomlParse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.apps.default.is_empty() || self.apps.chooser.is_empty() {
            return Err(ConfigError::Invalid("app path must not be empty"));
        }
        if self.fetch.timeout_ms == 0 {
            return Err(ConfigError::Invalid("fetch timeout must be positive"));
        }
        Ok(())
    }
}
