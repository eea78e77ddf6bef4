//! One-shot boot flag
//!
//! Written by the reset path just before a HOME restart, consumed by the
//! next supervisor startup. Its presence means "open the chooser".

use log::{info, warn};
use octobadge_hal::{FileStorage, StorageError, StorageKey};

/// Marker persisted across a HOME reset
pub struct BootFlag;

impl BootFlag {
    /// Storage key of the marker file
    pub const KEY: StorageKey = StorageKey::BootFlag;

    /// Read and delete the flag
    ///
    /// # Returns
    /// `true` if the flag was present. A failed delete is logged and the
    /// flag still counts as consumed for this boot.
    pub fn consume<S: FileStorage>(storage: &mut S) -> bool {
        if !storage.exists(Self::KEY) {
            return false;
        }

        match storage.remove(Self::KEY) {
            Ok(()) | Err(StorageError::NotFound) => {}
            Err(e) => warn!("Could not clear boot flag: {:?}", e),
        }
        info!("Boot flag present, opening chooser");
        true
    }

    /// Persist the flag for the next boot
    pub fn raise<S: FileStorage>(storage: &mut S) -> Result<(), StorageError> {
        storage.write(Self::KEY, b"1")
    }

    /// Check without consuming
    pub fn is_present<S: FileStorage>(storage: &mut S) -> bool {
        storage.exists(Self::KEY)
    }
}
