//! In-memory HAL doubles for unit tests
//!
//! Every double is a cheap handle onto shared state, so a test can hand one
//! clone to the code under test and keep another to script and inspect it.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use octobadge_hal::{
    ButtonSet, Buttons, ByteStream, Clock, FileStorage, Header, HomeHandler, InputPin, NetError,
    NetworkLink, StorageError, StorageKey, SystemControl, Transport,
};

use crate::config::RuntimeConfig;
use crate::runtime::{Board, Context, Platform, ResetSignal};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct StorageState {
    files: BTreeMap<StorageKey, Vec<u8>>,
    fail_writes: bool,
    fail_removes: bool,
}

/// File storage backed by a map
#[derive(Debug, Clone, Default)]
pub struct MemStorage {
    state: Arc<Mutex<StorageState>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: StorageKey, data: &[u8]) {
        lock(&self.state).files.insert(key, data.to_vec());
    }

    pub fn get(&self, key: StorageKey) -> Option<Vec<u8>> {
        lock(&self.state).files.get(&key).cloned()
    }

    pub fn contains(&self, key: StorageKey) -> bool {
        lock(&self.state).files.contains_key(&key)
    }

    /// Delete behind the back of the code under test
    pub fn remove_entry(&self, key: StorageKey) {
        lock(&self.state).files.remove(&key);
    }

    /// Make `create` and `append` fail with [`StorageError::Io`]
    pub fn fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Make `remove` fail with [`StorageError::Io`]
    pub fn fail_removes(&self, fail: bool) {
        lock(&self.state).fail_removes = fail;
    }
}

impl FileStorage for MemStorage {
    fn exists(&mut self, key: StorageKey) -> bool {
        self.contains(key)
    }

    fn size(&mut self, key: StorageKey) -> Result<usize, StorageError> {
        lock(&self.state)
            .files
            .get(&key)
            .map(Vec::len)
            .ok_or(StorageError::NotFound)
    }

    fn read(&mut self, key: StorageKey, offset: usize, buffer: &mut [u8]) -> Result<usize, StorageError> {
        let state = lock(&self.state);
        let data = state.files.get(&key).ok_or(StorageError::NotFound)?;
        let start = offset.min(data.len());
        let n = (data.len() - start).min(buffer.len());
        buffer[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn create(&mut self, key: StorageKey) -> Result<(), StorageError> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(StorageError::Io);
        }
        state.files.insert(key, Vec::new());
        Ok(())
    }

    fn append(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(StorageError::Io);
        }
        state
            .files
            .get_mut(&key)
            .ok_or(StorageError::NotFound)?
            .extend_from_slice(data);
        Ok(())
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError> {
        let mut state = lock(&self.state);
        if state.fail_removes {
            return Err(StorageError::Io);
        }
        state.files.remove(&key).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

#[derive(Debug, Clone)]
enum Route {
    Body {
        body: Vec<u8>,
        announced: Option<usize>,
        fail_at: Option<usize>,
    },
    Fail(NetError),
}

#[derive(Debug, Default)]
struct TransportState {
    routes: BTreeMap<String, Route>,
    opened: Vec<String>,
    headers: BTreeMap<String, Vec<(String, String)>>,
}

/// Transport serving canned bodies by URL
///
/// Unknown URLs answer 404.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<TransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(&self, url: &str, route: Route) {
        lock(&self.state).routes.insert(url.to_string(), route);
    }

    /// Serve `body` with its length announced
    pub fn respond(&self, url: &str, body: &[u8]) {
        self.route(
            url,
            Route::Body {
                body: body.to_vec(),
                announced: Some(body.len()),
                fail_at: None,
            },
        );
    }

    /// Serve `body` without a content length
    pub fn respond_unknown_length(&self, url: &str, body: &[u8]) {
        self.route(
            url,
            Route::Body {
                body: body.to_vec(),
                announced: None,
                fail_at: None,
            },
        );
    }

    /// Serve `body` but announce `announced` bytes
    pub fn respond_truncated(&self, url: &str, body: &[u8], announced: usize) {
        self.route(
            url,
            Route::Body {
                body: body.to_vec(),
                announced: Some(announced),
                fail_at: None,
            },
        );
    }

    /// Refuse to open `url`
    pub fn fail_open(&self, url: &str, error: NetError) {
        self.route(url, Route::Fail(error));
    }

    /// Break the stream of an already routed `url` once `offset` bytes were read
    pub fn fail_read_at(&self, url: &str, offset: usize) {
        let mut state = lock(&self.state);
        if let Some(Route::Body { fail_at, .. }) = state.routes.get_mut(url) {
            *fail_at = Some(offset);
        }
    }

    pub fn open_count(&self) -> usize {
        lock(&self.state).opened.len()
    }

    /// URLs opened so far, in order
    pub fn opened(&self) -> Vec<String> {
        lock(&self.state).opened.clone()
    }

    /// Headers sent with the last request for `url`
    pub fn headers_for(&self, url: &str) -> Vec<(String, String)> {
        lock(&self.state).headers.get(url).cloned().unwrap_or_default()
    }
}

impl Transport for MockTransport {
    type Stream = MockStream;

    fn open(&mut self, url: &str, headers: &[Header<'_>]) -> Result<MockStream, NetError> {
        let mut state = lock(&self.state);
        state.opened.push(url.to_string());
        state.headers.insert(
            url.to_string(),
            headers
                .iter()
                .map(|h| (h.name.to_string(), h.value.to_string()))
                .collect(),
        );

        match state.routes.get(url).cloned() {
            Some(Route::Body {
                body,
                announced,
                fail_at,
            }) => Ok(MockStream {
                body,
                position: 0,
                announced,
                fail_at,
            }),
            Some(Route::Fail(error)) => Err(error),
            None => Err(NetError::Status(404)),
        }
    }
}

/// Response body of [`MockTransport`]
#[derive(Debug)]
pub struct MockStream {
    body: Vec<u8>,
    position: usize,
    announced: Option<usize>,
    fail_at: Option<usize>,
}

impl ByteStream for MockStream {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        if self.fail_at.is_some_and(|at| self.position >= at) {
            return Err(NetError::Read);
        }
        let mut end = (self.position + buf.len()).min(self.body.len());
        if let Some(at) = self.fail_at {
            end = end.min(at.max(self.position));
        }
        let n = end - self.position;
        buf[..n].copy_from_slice(&self.body[self.position..end]);
        self.position = end;
        Ok(n)
    }

    fn content_length(&self) -> Option<usize> {
        self.announced
    }
}

/// Wi-Fi link that comes up after a scripted number of polls
#[derive(Debug, Clone, Default)]
pub struct MockLink {
    state: Arc<Mutex<LinkState>>,
}

#[derive(Debug, Default)]
struct LinkState {
    /// Polls needed after a join; `None` never connects
    connect_after: Option<usize>,
    polls: usize,
    joining: bool,
    joins: usize,
    last_ssid: Option<String>,
    fail_join: Option<NetError>,
}

impl MockLink {
    /// Report connected on the poll after `polls` unsuccessful ones
    pub fn connect_after(&self, polls: usize) {
        lock(&self.state).connect_after = Some(polls);
    }

    pub fn fail_join(&self, error: NetError) {
        lock(&self.state).fail_join = Some(error);
    }

    /// Drop the link; the next join starts over
    pub fn disconnect(&self) {
        let mut state = lock(&self.state);
        state.joining = false;
        state.polls = 0;
    }

    /// Number of joins started
    pub fn joins(&self) -> usize {
        lock(&self.state).joins
    }

    pub fn last_ssid(&self) -> Option<String> {
        lock(&self.state).last_ssid.clone()
    }
}

impl NetworkLink for MockLink {
    fn begin_connect(&mut self, ssid: &str, _password: Option<&str>) -> Result<(), NetError> {
        let mut state = lock(&self.state);
        state.joins += 1;
        state.last_ssid = Some(ssid.to_string());
        if let Some(error) = state.fail_join {
            return Err(error);
        }
        state.joining = true;
        state.polls = 0;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        let mut state = lock(&self.state);
        if !state.joining {
            return false;
        }
        let Some(needed) = state.connect_after else {
            return false;
        };
        state.polls += 1;
        state.polls > needed
    }
}

/// Clock moved by hand
///
/// With [`ManualClock::auto_step`] every read also advances it, which lets
/// busy-wait loops terminate.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
    step: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now_ms)),
            step: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn auto_step(&self, ms: u64) {
        self.step.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        let step = self.step.load(Ordering::SeqCst);
        self.now.fetch_add(step, Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct ButtonState {
    queue: VecDeque<ButtonSet>,
    reads: usize,
    armed: usize,
    home: Option<HomeHandler>,
    exit_trigger: Option<(usize, &'static ResetSignal)>,
}

/// Button matrix replaying a queue of held sets
///
/// Reads past the end of the queue see no buttons held.
#[derive(Debug, Clone, Default)]
pub struct ScriptedButtons {
    state: Arc<Mutex<ButtonState>>,
}

impl ScriptedButtons {
    pub fn push(&self, held: ButtonSet) {
        lock(&self.state).queue.push_back(held);
    }

    /// Queued reads not consumed yet
    pub fn remaining(&self) -> usize {
        lock(&self.state).queue.len()
    }

    pub fn reads(&self) -> usize {
        lock(&self.state).reads
    }

    /// Times the HOME interrupt was armed
    pub fn armed(&self) -> usize {
        lock(&self.state).armed
    }

    /// Run the bound HOME handler as the edge interrupt would
    ///
    /// Returns `false` if nothing was bound.
    pub fn fire_home(&self) -> bool {
        let home = lock(&self.state).home;
        match home {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    /// Fire `signal` as the HOME interrupt would, during the `nth` read from now
    pub fn request_exit_on_read(&self, nth: usize, signal: &'static ResetSignal) {
        let mut state = lock(&self.state);
        let at = state.reads + nth;
        state.exit_trigger = Some((at, signal));
    }
}

impl Buttons for ScriptedButtons {
    fn read(&mut self) -> ButtonSet {
        let mut state = lock(&self.state);
        state.reads += 1;
        if let Some((at, signal)) = state.exit_trigger {
            if state.reads == at {
                signal.request_exit();
                state.exit_trigger = None;
            }
        }
        state.queue.pop_front().unwrap_or(ButtonSet::EMPTY)
    }

    fn arm_home_interrupt(&mut self, handler: HomeHandler) {
        let mut state = lock(&self.state);
        state.armed += 1;
        state.home = Some(handler);
    }
}

/// HOME line held low for a number of reads
#[derive(Debug, Clone, Default)]
pub struct MockPin {
    pressed: Arc<AtomicUsize>,
}

impl MockPin {
    pub fn pressed_for(reads: usize) -> Self {
        Self {
            pressed: Arc::new(AtomicUsize::new(reads)),
        }
    }

    pub fn remaining_pressed(&self) -> usize {
        self.pressed.load(Ordering::SeqCst)
    }
}

impl InputPin for MockPin {
    fn is_high(&self) -> bool {
        self.pressed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err()
    }
}

/// Power control that panics instead of leaving the process
#[derive(Debug, Clone, Copy, Default)]
pub struct MockSystem;

impl SystemControl for MockSystem {
    fn reset(&mut self) -> ! {
        panic!("device reset")
    }

    fn deep_sleep(&mut self) -> ! {
        panic!("deep sleep")
    }
}

/// Board made of the in-memory doubles
pub struct MockPlatform;

impl Platform for MockPlatform {
    type Storage = MemStorage;
    type Transport = MockTransport;
    type Clock = ManualClock;
    type Buttons = ScriptedButtons;
    type Link = MockLink;
    type System = MockSystem;
}

/// Test-side handles onto the board of a [`mock_context`]
#[derive(Debug, Clone)]
pub struct MockHandles {
    pub storage: MemStorage,
    pub transport: MockTransport,
    pub clock: ManualClock,
    pub buttons: ScriptedButtons,
    pub link: MockLink,
}

/// Context over fresh doubles with the default runtime configuration
pub fn mock_context() -> (Context<MockPlatform>, MockHandles) {
    mock_context_on(MemStorage::new())
}

/// Like [`mock_context`], but over existing storage, as after a restart
pub fn mock_context_on(storage: MemStorage) -> (Context<MockPlatform>, MockHandles) {
    let handles = MockHandles {
        storage,
        transport: MockTransport::new(),
        clock: ManualClock::new(0),
        buttons: ScriptedButtons::default(),
        link: MockLink::default(),
    };
    let board = Board {
        storage: handles.storage.clone(),
        transport: handles.transport.clone(),
        clock: handles.clock.clone(),
        buttons: handles.buttons.clone(),
        link: handles.link.clone(),
        system: MockSystem,
    };
    (Context::new(board, RuntimeConfig::default()), handles)
}
