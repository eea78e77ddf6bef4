//! Interrupt-driven reset path
//!
//! HOME is wired to a falling-edge interrupt that restarts the badge into
//! the chooser, whatever the running app is doing. The running app is
//! exclusively borrowed by the frame loop, so the handler cannot call its
//! `on_exit`. Instead the supervisor publishes, after every tick, the file
//! the app is partway through writing, and the handler removes it itself:
//!
//! ```text
//!  interrupt context                     cooperative loop
//!  -----------------                     ----------------
//!                               <------  set_pending_artifact() after each
//!                                        update
//!  ResetSignal::request_exit()  ------>  FrameScheduler sees it at the top
//!  wait for HOME release                 of the next tick, supervisor runs
//!  wait <= exit_grace_ms for ack <-----  on_exit and acknowledges
//!  remove pending artifact
//!  BootFlag::raise (errors ignored)
//!  SystemControl::reset()  -> !
//! ```
//!
//! On a single core the handler preempts the loop, so the acknowledgement
//! never arrives and the grace wait only bounds the delay. The full
//! `on_exit` handshake completes only when the handler runs on another core
//! or thread, as on the host.

use core::hint::spin_loop;

use log::{info, warn};
use octobadge_hal::{ActiveLowButton, Clock, FileStorage, InputPin, StorageKey, SystemControl};
use portable_atomic::{AtomicBool, AtomicU8, Ordering};

use super::BootFlag;
use crate::storage::remove_if_present;

/// No artifact pending
const NO_ARTIFACT: u8 = u8::MAX;

/// Exit request shared between the reset interrupt and the frame loop
///
/// Boards keep one in a `static` so the interrupt handler can reach it.
#[derive(Debug)]
pub struct ResetSignal {
    exit_requested: AtomicBool,
    exit_acknowledged: AtomicBool,
    pending_artifact: AtomicU8,
}

impl ResetSignal {
    pub const fn new() -> Self {
        Self {
            exit_requested: AtomicBool::new(false),
            exit_acknowledged: AtomicBool::new(false),
            pending_artifact: AtomicU8::new(NO_ARTIFACT),
        }
    }

    /// Ask the running app to wind down at its next safe point
    pub fn request_exit(&self) {
        self.exit_requested.store(true, Ordering::Release);
    }

    pub fn is_exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::Acquire)
    }

    /// Report that the running app's `on_exit` has finished
    pub fn acknowledge_exit(&self) {
        self.exit_acknowledged.store(true, Ordering::Release);
    }

    pub fn is_exit_acknowledged(&self) -> bool {
        self.exit_acknowledged.load(Ordering::Acquire)
    }

    /// Record the file the running app has half written, if any
    pub fn set_pending_artifact(&self, key: Option<StorageKey>) {
        let raw = key.map_or(NO_ARTIFACT, StorageKey::as_u8);
        self.pending_artifact.store(raw, Ordering::Release);
    }

    pub fn pending_artifact(&self) -> Option<StorageKey> {
        StorageKey::from_u8(self.pending_artifact.load(Ordering::Acquire))
    }

    /// Claim the pending artifact so only one side removes it
    pub fn take_pending_artifact(&self) -> Option<StorageKey> {
        StorageKey::from_u8(self.pending_artifact.swap(NO_ARTIFACT, Ordering::AcqRel))
    }
}

impl Default for ResetSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// HOME interrupt handler
///
/// Owns its own handles to storage, system control and the clock so it
/// does not depend on the state of the interrupted frame loop.
pub struct ResetPath<'a, Pin, S, Y, C> {
    signal: &'a ResetSignal,
    home: Pin,
    storage: S,
    system: Y,
    clock: C,
    exit_grace_ms: u64,
}

impl<'a, Pin, S, Y, C> ResetPath<'a, Pin, S, Y, C>
where
    Pin: InputPin,
    S: FileStorage,
    Y: SystemControl,
    C: Clock,
{
    /// # Arguments
    /// * `home` - The HOME button pin, low while pressed
    /// * `exit_grace_ms` - Upper bound on waiting for the app's `on_exit`
    pub fn new(
        signal: &'a ResetSignal,
        home: Pin,
        storage: S,
        system: Y,
        clock: C,
        exit_grace_ms: u64,
    ) -> Self {
        Self {
            signal,
            home,
            storage,
            system,
            clock,
            exit_grace_ms,
        }
    }

    /// Run the falling-edge handler; never returns
    pub fn on_falling_edge(&mut self) -> ! {
        self.prepare();
        info!("Restarting");
        self.system.reset()
    }

    /// Every step of the handler except the restart itself
    pub fn prepare(&mut self) {
        info!("HOME pressed, leaving app");
        self.signal.request_exit();

        while self.home.is_pressed() {
            spin_loop();
        }

        let start = self.clock.now_ms();
        while !self.signal.is_exit_acknowledged() {
            if self.clock.elapsed_ms(start) >= self.exit_grace_ms {
                warn!("App did not exit within {}ms", self.exit_grace_ms);
                break;
            }
            spin_loop();
        }

        // The loop is suspended or too slow; do the app's cleanup here
        if let Some(key) = self.signal.take_pending_artifact() {
            info!("Removing unfinished {}", key.path());
            if let Err(e) = remove_if_present(&mut self.storage, key) {
                warn!("Could not remove {}: {:?}", key.path(), e);
            }
        }

        if let Err(e) = BootFlag::raise(&mut self.storage) {
            warn!("Could not write boot flag: {:?}", e);
        }
    }
}
