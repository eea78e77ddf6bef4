//! Directory-backed file storage
//!
//! Each [`StorageKey`] maps to its badge path below a root directory, so
//! `/secrets.toml` lives at `<root>/secrets.toml`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use octobadge_hal::{FileStorage, StorageError, StorageKey};

/// Badge filesystem rooted at a host directory
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    /// Use `root` as the badge filesystem root, creating it if needed
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path of a badge file
    pub fn path_of(&self, key: StorageKey) -> PathBuf {
        self.root.join(key.path().trim_start_matches('/'))
    }
}

fn map_io(e: io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        ErrorKind::InvalidData => StorageError::Corrupted,
        _ => StorageError::Io,
    }
}

impl FileStorage for DirStorage {
    fn exists(&mut self, key: StorageKey) -> bool {
        self.path_of(key).is_file()
    }

    fn size(&mut self, key: StorageKey) -> Result<usize, StorageError> {
        let meta = fs::metadata(self.path_of(key)).map_err(map_io)?;
        usize::try_from(meta.len()).map_err(|_| StorageError::Corrupted)
    }

    fn read(
        &mut self,
        key: StorageKey,
        offset: usize,
        buffer: &mut [u8],
    ) -> Result<usize, StorageError> {
        let mut file = File::open(self.path_of(key)).map_err(map_io)?;
        file.seek(SeekFrom::Start(offset as u64)).map_err(map_io)?;

        // Fill as much of the buffer as the file allows
        let mut filled = 0;
        while filled < buffer.len() {
            match file.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(map_io(e)),
            }
        }
        Ok(filled)
    }

    fn create(&mut self, key: StorageKey) -> Result<(), StorageError> {
        File::create(self.path_of(key)).map_err(map_io)?;
        Ok(())
    }

    fn append(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(self.path_of(key))
            .map_err(map_io)?;
        file.write_all(data).map_err(map_io)
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError> {
        fs::remove_file(self.path_of(key)).map_err(map_io)
    }
}
