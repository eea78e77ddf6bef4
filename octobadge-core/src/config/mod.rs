//! Configuration types
//!
//! Board-agnostic configuration structures stored as TOML documents on the
//! badge filesystem.

pub mod loader;
pub mod secrets;
pub mod types;

pub use secrets::*;
pub use types::*;

use octobadge_hal::StorageError;

/// Configuration loading errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Storage operation failed
    Storage(StorageError),
    /// Document exceeds the read buffer
    TooLarge,
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// TOML parsing failed
    TomlParse,
    /// Parsed, but a value is out of range
    Invalid(&'static str),
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        ConfigError::Storage(e)
    }
}
