//! Configuration persistence
//!
//! Loads the runtime configuration and the credentials from storage.
//! The runtime configuration falls back to built-in defaults if the file is
//! missing or invalid; the credentials have no defaults.

use core::str;

use log::{debug, info, warn};
use octobadge_hal::{FileStorage, StorageError, StorageKey};

use super::{ConfigError, RuntimeConfig, Secrets};
use crate::storage::read_all;

/// Maximum TOML document size
const MAX_TOML_SIZE: usize = 4096;

impl RuntimeConfig {
    /// Load `/config.toml`, or defaults if it is absent or unusable
    pub fn load<S: FileStorage>(storage: &mut S) -> Self {
        match Self::try_load(storage) {
            Ok(config) => {
                info!("Loaded runtime configuration");
                debug!(
                    "  default={} chooser={} chunk={} timeout={}ms",
                    config.apps.default,
                    config.apps.chooser,
                    config.fetch.effective_chunk_size(),
                    config.fetch.timeout_ms
                );
                config
            }
            Err(ConfigError::Storage(StorageError::NotFound)) => {
                debug!("No runtime configuration found, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!("Failed to load runtime configuration: {:?}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load `/config.toml`, reporting why it could not be used
    pub fn try_load<S: FileStorage>(storage: &mut S) -> Result<Self, ConfigError> {
        let text = read_toml(storage, StorageKey::RuntimeConfig)?;
        Self::from_toml(&text)
    }
}

impl Secrets {
    /// Load `/secrets.toml`
    ///
    /// # Returns
    /// `Ok(None)` if the file does not exist.
    pub fn load<S: FileStorage>(storage: &mut S) -> Result<Option<Self>, ConfigError> {
        let text = match read_toml(storage, StorageKey::Secrets) {
            Ok(text) => text,
            Err(ConfigError::Storage(StorageError::NotFound)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let secrets = toml::from_str(&text).map_err(|_| ConfigError::TomlParse)?;
        Ok(Some(secrets))
    }
}

fn read_toml<S: FileStorage>(
    storage: &mut S,
    key: StorageKey,
) -> Result<alloc::string::String, ConfigError> {
    let bytes = read_all(storage, key, MAX_TOML_SIZE).map_err(|e| match e {
        StorageError::BufferTooSmall => ConfigError::TooLarge,
        e => ConfigError::Storage(e),
    })?;
    debug!("Read {} bytes of TOML from {}", bytes.len(), key.path());

    let text = str::from_utf8(&bytes).map_err(|_| ConfigError::InvalidUtf8)?;
    Ok(alloc::string::String::from(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemStorage;

    #[test]
    fn test_load_missing_uses_defaults() {
        let mut storage = MemStorage::new();
        assert_eq!(RuntimeConfig::load(&mut storage), RuntimeConfig::default());
        assert_eq!(
            RuntimeConfig::try_load(&mut storage),
            Err(ConfigError::Storage(StorageError::NotFound))
        );
    }

    #[test]
    fn test_load_invalid_uses_defaults() {
        let mut storage = MemStorage::new();
        storage.put(StorageKey::RuntimeConfig, b"[fetch\nchunk_size = 3");
        assert_eq!(RuntimeConfig::load(&mut storage), RuntimeConfig::default());

        storage.put(StorageKey::RuntimeConfig, &[0xff, 0xfe, 0x00]);
        assert_eq!(
            RuntimeConfig::try_load(&mut storage),
            Err(ConfigError::InvalidUtf8)
        );
    }

    #[test]
    fn test_load_override() {
        let mut storage = MemStorage::new();
        storage.put(StorageKey::RuntimeConfig, b"[fetch]\ntimeout_ms = 1000\n");
        assert_eq!(RuntimeConfig::load(&mut storage).fetch.timeout_ms, 1000);
    }

    #[test]
    fn test_load_too_large() {
        let mut storage = MemStorage::new();
        storage.put(StorageKey::RuntimeConfig, &[b'#'; MAX_TOML_SIZE + 1]);
        assert_eq!(
            RuntimeConfig::try_load(&mut storage),
            Err(ConfigError::TooLarge)
        );
    }

    #[test]
    fn test_load_secrets() {
        let mut storage = MemStorage::new();
        assert_eq!(Secrets::load(&mut storage), Ok(None));

        storage.put(
            StorageKey::Secrets,
            b"wifi_ssid = \"Universe\"\ngithub_username = \"mona\"\ngithub_token = \"ghp_x\"\n",
        );
        let secrets = Secrets::load(&mut storage).unwrap().unwrap();
        assert_eq!(secrets.handle(), Some("mona"));
        assert_eq!(secrets.token(), Some("ghp_x"));

        storage.put(StorageKey::Secrets, b"wifi_ssid = ");
        assert_eq!(Secrets::load(&mut storage), Err(ConfigError::TomlParse));
    }
}
