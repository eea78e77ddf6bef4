//! Platform binding and the per-runtime context
//!
//! A [`Platform`] names the concrete HAL types of one board. The
//! [`Context`] owns those peripherals plus the runtime configuration and
//! the input snapshot, and is lent to the scheduler, the apps and the
//! orchestrator in turn.

use heapless::Vec;
use log::debug;
use octobadge_hal::{
    Buttons, Clock, FileStorage, InputState, NetworkLink, SystemControl, Transport,
};

use crate::app::MAX_APPS;
use crate::config::RuntimeConfig;

/// HAL types of one board
pub trait Platform: 'static {
    type Storage: FileStorage + 'static;
    type Transport: Transport + 'static;
    type Clock: Clock + 'static;
    type Buttons: Buttons + 'static;
    type Link: NetworkLink + 'static;
    type System: SystemControl + 'static;
}

/// Peripherals of one board
pub struct Board<P: Platform> {
    pub storage: P::Storage,
    pub transport: P::Transport,
    pub clock: P::Clock,
    pub buttons: P::Buttons,
    pub link: P::Link,
    pub system: P::System,
}

/// An app as shown by the chooser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppListing {
    pub path: &'static str,
    pub label: &'static str,
}

/// Everything an app may touch while it runs
pub struct Context<P: Platform> {
    pub board: Board<P>,
    pub config: RuntimeConfig,
    input: InputState,
    catalog: Vec<AppListing, MAX_APPS>,
}

impl<P: Platform> Context<P> {
    pub fn new(board: Board<P>, config: RuntimeConfig) -> Self {
        Self {
            board,
            config,
            input: InputState::default(),
            catalog: Vec::new(),
        }
    }

    /// Read the buttons and derive this tick's edges
    pub fn poll_input(&mut self) -> InputState {
        let held = self.board.buttons.read();
        self.input = self.input.advance(held);
        self.input
    }

    /// Input snapshot of the current tick
    pub fn input(&self) -> InputState {
        self.input
    }

    /// Poll until no button is held
    ///
    /// Keeps the press that ended one app from reaching the next.
    pub fn wait_for_release(&mut self) {
        let mut polls: u32 = 0;
        while !self.poll_input().held.is_empty() {
            polls += 1;
        }
        if polls > 0 {
            debug!("Buttons released after {} polls", polls);
        }
        // Start the next app without stale edges
        self.input = InputState::default();
    }

    /// Apps the chooser offers
    pub fn catalog(&self) -> &[AppListing] {
        &self.catalog
    }

    pub(crate) fn set_catalog(&mut self, listings: impl Iterator<Item = AppListing>) {
        self.catalog.clear();
        for listing in listings {
            if self.catalog.push(listing).is_err() {
                break;
            }
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.board.clock.now_ms()
    }
}
