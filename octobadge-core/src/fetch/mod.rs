//! Resumable, chunked downloads
//!
//! A [`FetchTask`] copies one remote resource into one storage file, a
//! bounded chunk per [`FetchTask::resume`] call, so a slow download can be
//! spread across frame ticks without ever blocking the frame loop.
//!
//! ```text
//! Created --resume--> InProgress --resume--> ... --> Completed
//!    |                    |
//!    +----> Failed <------+      (transport or storage error)
//!    +----> TimedOut <----+      (now - created >= timeout)
//! ```

pub mod request;
pub mod task;

pub use request::*;
pub use task::*;

use octobadge_hal::{NetError, StorageError};

use crate::config::FetchConfig;

/// Upper bound on bytes moved by a single resume
///
/// Also the size of the stack buffer a resume reads into.
pub const MAX_CHUNK_SIZE: usize = 1024;

/// Why a fetch task failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchError {
    /// Request could not be issued or was rejected
    Connect(NetError),
    /// Body read failed mid-transfer
    Read(NetError),
    /// Destination file could not be written
    Storage(StorageError),
    /// Body ended before its announced length
    Truncated { expected: usize, received: usize },
    /// URL or headers do not fit the request buffers
    RequestTooLarge,
}

impl From<StorageError> for FetchError {
    fn from(e: StorageError) -> Self {
        FetchError::Storage(e)
    }
}

/// Per-task tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Deadline measured from task creation
    pub timeout_ms: u64,
    /// Bytes per resume, clamped to `1..=MAX_CHUNK_SIZE`
    pub chunk_size: usize,
    /// Download even if the destination already exists
    pub force_refresh: bool,
}

impl FetchOptions {
    /// Options from the runtime configuration, without forced refresh
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            timeout_ms: config.timeout_ms,
            chunk_size: config.effective_chunk_size(),
            force_refresh: false,
        }
    }

    /// Set whether the cache short-circuit is bypassed
    pub fn forced(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}
