//! Frame scheduler
//!
//! Runs one app's update function once per frame tick until it asks to
//! leave. A tick is: observe the reset signal, poll input, call update.

use log::debug;

use super::{Context, Platform, ResetSignal};
use crate::app::{AppPath, Signal};

/// Why the frame loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameExit {
    /// Update returned [`Signal::Stop`]
    Stopped,
    /// Update returned [`Signal::SwitchTo`]
    SwitchTo(AppPath),
    /// The reset path asked the runtime to wind down
    Interrupted,
}

/// Drives the frame loop and counts ticks
#[derive(Debug, Default)]
pub struct FrameScheduler {
    ticks: u64,
}

impl FrameScheduler {
    pub const fn new() -> Self {
        Self { ticks: 0 }
    }

    /// Run `update` once per tick until it returns something other than
    /// [`Signal::Continue`], or until an exit is requested
    ///
    /// The reset signal is checked before input is polled, so an
    /// interrupted tick never calls `update`.
    pub fn run<P, F>(&mut self, ctx: &mut Context<P>, signal: &ResetSignal, mut update: F) -> FrameExit
    where
        P: Platform,
        F: FnMut(&mut Context<P>) -> Signal,
    {
        let start = self.ticks;
        let exit = loop {
            if signal.is_exit_requested() {
                break FrameExit::Interrupted;
            }

            ctx.poll_input();
            self.ticks += 1;

            match update(ctx) {
                Signal::Continue => {}
                Signal::Stop => break FrameExit::Stopped,
                Signal::SwitchTo(path) => break FrameExit::SwitchTo(path),
            }
        };

        debug!("Frame loop ended after {} ticks: {:?}", self.ticks - start, exit);
        exit
    }

    /// Ticks run since construction, across all apps
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
