//! Fetch task state machine

use log::{debug, info, warn};
use octobadge_hal::{ByteStream, Clock, FileStorage, StorageKey, Transport};

use super::{FetchError, FetchOptions, FetchRequest, MAX_CHUNK_SIZE};
use crate::storage::remove_if_present;

/// Fetch task states
///
/// Transitions are monotonic; the last three states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchState {
    /// Not resumed yet; no connection, destination untouched
    Created,
    /// Stream open, destination receiving chunks
    InProgress,
    /// Whole body written to the destination
    Completed,
    /// Transport or storage error; destination removed
    Failed,
    /// Deadline passed; destination removed
    TimedOut,
}

/// Inputs to the fetch state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchEvent {
    /// Stream opened and destination created
    Opened,
    /// End of body reached
    Finished,
    /// Transport or storage error
    Errored,
    /// Deadline observed on resume
    DeadlinePassed,
}

impl FetchState {
    /// Check if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FetchState::Completed | FetchState::Failed | FetchState::TimedOut
        )
    }

    /// Process an event and return the next state
    pub fn transition(self, event: FetchEvent) -> Self {
        use FetchEvent::*;
        use FetchState::*;

        match (self, event) {
            (Created, Opened) => InProgress,
            (Created | InProgress, Finished) => Completed,
            (Created | InProgress, Errored) => Failed,
            (Created | InProgress, DeadlinePassed) => TimedOut,

            // Terminal states are sticky; InProgress ignores a second Opened
            (state, _) => state,
        }
    }
}

/// Result of one resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchPoll {
    /// More chunks to go
    Pending,
    /// Destination holds the full body
    Completed,
    /// Destination removed
    Failed(FetchError),
    /// Destination removed
    TimedOut,
}

impl FetchPoll {
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchPoll::Pending)
    }
}

/// Outcome of [`FetchTask::prepare`]
#[derive(Debug)]
pub enum Prepared<St> {
    /// Destination already exists; nothing to download
    CacheHit,
    /// A task that must be resumed until it reaches a terminal state
    Task(FetchTask<St>),
}

/// One chunked download bound to a request and a destination file
///
/// Generic over the transport's stream type so the open stream can live
/// inside the task between resumes.
#[derive(Debug)]
pub struct FetchTask<St> {
    request: FetchRequest,
    destination: StorageKey,
    state: FetchState,
    created_at_ms: u64,
    timeout_ms: u64,
    chunk_size: usize,
    bytes: usize,
    expected: Option<usize>,
    stream: Option<St>,
    outcome: Option<FetchPoll>,
}

impl<St: ByteStream> FetchTask<St> {
    /// Create a task, or short-circuit on a cached destination
    ///
    /// # Arguments
    /// * `now_ms` - Creation time; the deadline is relative to it
    /// * `options` - Deadline, chunk size and forced refresh
    pub fn prepare<S: FileStorage>(
        request: FetchRequest,
        destination: StorageKey,
        storage: &mut S,
        now_ms: u64,
        options: FetchOptions,
    ) -> Prepared<St> {
        if !options.force_refresh && storage.exists(destination) {
            debug!("{} cached, no fetch", destination.path());
            return Prepared::CacheHit;
        }

        Prepared::Task(Self::new(request, destination, now_ms, options))
    }

    /// Create a task unconditionally
    pub fn new(
        request: FetchRequest,
        destination: StorageKey,
        now_ms: u64,
        options: FetchOptions,
    ) -> Self {
        debug!(
            "New fetch {} -> {} (chunk {}, timeout {}ms)",
            request.url(),
            destination.path(),
            options.chunk_size,
            options.timeout_ms
        );

        Self {
            request,
            destination,
            state: FetchState::Created,
            created_at_ms: now_ms,
            timeout_ms: options.timeout_ms,
            chunk_size: options.chunk_size.clamp(1, MAX_CHUNK_SIZE),
            bytes: 0,
            expected: None,
            stream: None,
            outcome: None,
        }
    }

    /// Advance the download by at most one chunk
    ///
    /// The first resume opens the stream and truncates the destination.
    /// Every resume checks the deadline before doing any I/O. Resuming a
    /// finished task does nothing and returns the same terminal result.
    pub fn resume<T, S, C>(&mut self, transport: &mut T, storage: &mut S, clock: &C) -> FetchPoll
    where
        T: Transport<Stream = St>,
        S: FileStorage,
        C: Clock,
    {
        if let Some(outcome) = self.outcome {
            warn!(
                "Resume on finished fetch of {} ({:?})",
                self.destination.path(),
                self.state
            );
            return outcome;
        }

        let now = clock.now_ms();
        if now.saturating_sub(self.created_at_ms) >= self.timeout_ms {
            return self.time_out(storage);
        }

        if self.state == FetchState::Created {
            if let Err(e) = self.open(transport, storage) {
                return self.fail(storage, e);
            }
        }

        match self.transfer_chunk(storage) {
            Ok(true) => self.complete(),
            Ok(false) => FetchPoll::Pending,
            Err(e) => self.fail(storage, e),
        }
    }

    fn open<T, S>(&mut self, transport: &mut T, storage: &mut S) -> Result<(), FetchError>
    where
        T: Transport<Stream = St>,
        S: FileStorage,
    {
        let headers = self.request.header_refs();
        let stream = transport
            .open(self.request.url(), &headers)
            .map_err(FetchError::Connect)?;
        self.expected = stream.content_length();
        self.stream = Some(stream);

        storage.create(self.destination)?;
        self.state = self.state.transition(FetchEvent::Opened);

        debug!(
            "Fetch of {} open, length {:?}",
            self.destination.path(),
            self.expected
        );
        Ok(())
    }

    /// One bounded read plus one append
    ///
    /// # Returns
    /// `true` once the whole body is on storage.
    fn transfer_chunk<S: FileStorage>(&mut self, storage: &mut S) -> Result<bool, FetchError> {
        let want = match self.expected {
            Some(expected) if self.bytes >= expected => return Ok(true),
            Some(expected) => self.chunk_size.min(expected - self.bytes),
            None => self.chunk_size,
        };

        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Err(FetchError::Read(octobadge_hal::NetError::NotConnected)),
        };

        let mut buf = [0u8; MAX_CHUNK_SIZE];
        let n = stream
            .read_into(&mut buf[..want])
            .map_err(FetchError::Read)?;

        if n == 0 {
            return match self.expected {
                Some(expected) => Err(FetchError::Truncated {
                    expected,
                    received: self.bytes,
                }),
                None => Ok(true),
            };
        }

        storage.append(self.destination, &buf[..n])?;
        self.bytes += n;

        Ok(matches!(self.expected, Some(expected) if self.bytes >= expected))
    }

    fn complete(&mut self) -> FetchPoll {
        info!(
            "Fetched {} bytes into {}",
            self.bytes,
            self.destination.path()
        );
        self.finish(FetchEvent::Finished, FetchPoll::Completed)
    }

    fn fail<S: FileStorage>(&mut self, storage: &mut S, error: FetchError) -> FetchPoll {
        warn!(
            "Fetch of {} failed after {} bytes: {:?}",
            self.request.url(),
            self.bytes,
            error
        );
        self.discard_output(storage);
        self.finish(FetchEvent::Errored, FetchPoll::Failed(error))
    }

    fn time_out<S: FileStorage>(&mut self, storage: &mut S) -> FetchPoll {
        warn!(
            "Fetch of {} timed out after {} bytes",
            self.request.url(),
            self.bytes
        );
        self.discard_output(storage);
        self.finish(FetchEvent::DeadlinePassed, FetchPoll::TimedOut)
    }

    fn finish(&mut self, event: FetchEvent, outcome: FetchPoll) -> FetchPoll {
        self.stream = None;
        self.state = self.state.transition(event);
        self.outcome = Some(outcome);
        outcome
    }

    fn discard_output<S: FileStorage>(&mut self, storage: &mut S) {
        if let Err(e) = remove_if_present(storage, self.destination) {
            warn!(
                "Could not remove partial {}: {:?}",
                self.destination.path(),
                e
            );
        }
    }

    /// Drop a task before it finished, removing any partial output
    pub fn cancel<S: FileStorage>(mut self, storage: &mut S) {
        if self.state == FetchState::InProgress {
            debug!("Cancelling fetch of {}", self.destination.path());
            self.discard_output(storage);
        }
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn destination(&self) -> StorageKey {
        self.destination
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    pub fn bytes_transferred(&self) -> usize {
        self.bytes
    }

    /// Announced body length, known once the stream is open
    pub fn expected_len(&self) -> Option<usize> {
        self.expected
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    /// Absolute time at which the task times out
    pub fn deadline_ms(&self) -> u64 {
        self.created_at_ms.saturating_add(self.timeout_ms)
    }
}
