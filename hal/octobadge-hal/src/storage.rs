//! Durable storage abstractions
//!
//! The runtime only ever touches a handful of well-known files. They are
//! addressed by [`StorageKey`] rather than by free-form paths so a board can
//! map them onto whatever it has (a FAT partition, a key-value flash map, a
//! host directory).

/// Well-known files used by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// One-shot marker written before a HOME reset
    BootFlag = 0,
    /// Cached GitHub user document
    UserData = 1,
    /// Cached contribution calendar document
    ContribData = 2,
    /// Cached avatar image
    Avatar = 3,
    /// Wi-Fi and GitHub credentials (TOML)
    Secrets = 4,
    /// Runtime tuning overrides (TOML)
    RuntimeConfig = 5,
}

impl StorageKey {
    /// Every key, in discriminant order
    pub const ALL: [StorageKey; 6] = [
        StorageKey::BootFlag,
        StorageKey::UserData,
        StorageKey::ContribData,
        StorageKey::Avatar,
        StorageKey::Secrets,
        StorageKey::RuntimeConfig,
    ];

    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a key from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::BootFlag),
            1 => Some(StorageKey::UserData),
            2 => Some(StorageKey::ContribData),
            3 => Some(StorageKey::Avatar),
            4 => Some(StorageKey::Secrets),
            5 => Some(StorageKey::RuntimeConfig),
            _ => None,
        }
    }

    /// Absolute path of the backing file on the badge filesystem
    pub fn path(self) -> &'static str {
        match self {
            StorageKey::BootFlag => "/show_menu",
            StorageKey::UserData => "/user_data.json",
            StorageKey::ContribData => "/contrib_data.json",
            StorageKey::Avatar => "/avatar.png",
            StorageKey::Secrets => "/secrets.toml",
            StorageKey::RuntimeConfig => "/config.toml",
        }
    }

    /// Look a key up by its path
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.path() == path)
    }

    /// Returns true for files produced by a download
    pub fn is_cache_artifact(self) -> bool {
        matches!(
            self,
            StorageKey::UserData | StorageKey::ContribData | StorageKey::Avatar
        )
    }
}

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Underlying device or filesystem error
    Io,
    /// File does not exist
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
    /// Data corrupted or invalid
    Corrupted,
    /// Storage is full
    Full,
}

/// File storage trait
///
/// Files are flat byte streams. Writers build a file with [`create`] followed
/// by any number of [`append`] calls, which is what lets a download land on
/// storage one chunk at a time.
///
/// [`create`]: FileStorage::create
/// [`append`]: FileStorage::append
pub trait FileStorage {
    /// Check if a file exists
    fn exists(&mut self, key: StorageKey) -> bool;

    /// Size of a file in bytes
    fn size(&mut self, key: StorageKey) -> Result<usize, StorageError>;

    /// Read from a file starting at `offset`
    ///
    /// # Returns
    /// The number of bytes copied into `buffer`, 0 at end of file.
    fn read(
        &mut self,
        key: StorageKey,
        offset: usize,
        buffer: &mut [u8],
    ) -> Result<usize, StorageError>;

    /// Create an empty file, truncating any existing content
    fn create(&mut self, key: StorageKey) -> Result<(), StorageError>;

    /// Append data to an existing file
    fn append(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a file
    ///
    /// Returns [`StorageError::NotFound`] if there was nothing to delete.
    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError>;

    /// Replace the content of a file in one go
    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        self.create(key)?;
        self.append(key, data)
    }
}
