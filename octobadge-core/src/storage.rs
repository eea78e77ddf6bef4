//! Helpers on top of [`FileStorage`]

use alloc::vec;
use alloc::vec::Vec;

use octobadge_hal::{FileStorage, StorageError, StorageKey};

/// Read a whole file into memory
///
/// Fails with [`StorageError::BufferTooSmall`] if the file is larger than
/// `limit` bytes.
pub fn read_all<S: FileStorage>(
    storage: &mut S,
    key: StorageKey,
    limit: usize,
) -> Result<Vec<u8>, StorageError> {
    let size = storage.size(key)?;
    if size > limit {
        return Err(StorageError::BufferTooSmall);
    }

    let mut data = vec![0u8; size];
    let mut filled = 0;
    while filled < size {
        let n = storage.read(key, filled, &mut data[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    data.truncate(filled);
    Ok(data)
}

/// Delete a file, treating "already gone" as success
pub fn remove_if_present<S: FileStorage>(
    storage: &mut S,
    key: StorageKey,
) -> Result<(), StorageError> {
    match storage.remove(key) {
        Ok(()) | Err(StorageError::NotFound) => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemStorage;

    #[test]
    fn test_read_all() {
        let mut storage = MemStorage::new();
        storage.put(StorageKey::UserData, b"{\"a\":1}");

        let data = read_all(&mut storage, StorageKey::UserData, 64).unwrap();
        assert_eq!(data, b"{\"a\":1}");
    }

    #[test]
    fn test_read_all_limit() {
        let mut storage = MemStorage::new();
        storage.put(StorageKey::UserData, &[0u8; 32]);

        assert_eq!(
            read_all(&mut storage, StorageKey::UserData, 16),
            Err(StorageError::BufferTooSmall)
        );
        assert_eq!(
            read_all(&mut storage, StorageKey::Avatar, 16),
            Err(StorageError::NotFound)
        );
    }

    #[test]
    fn test_remove_if_present() {
        let mut storage = MemStorage::new();
        storage.put(StorageKey::Avatar, b"x");

        assert!(remove_if_present(&mut storage, StorageKey::Avatar).is_ok());
        assert!(!storage.contains(StorageKey::Avatar));
        assert!(remove_if_present(&mut storage, StorageKey::Avatar).is_ok());
    }
}
