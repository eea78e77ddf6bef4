//! App contract and built-in apps
//!
//! An app owns the display while it runs. The supervisor calls
//! [`App::init`] once, [`App::update`] once per frame tick until it returns
//! something other than [`Signal::Continue`], then [`App::on_exit`].
//! Hook failures are logged by the supervisor and never stop the runtime.

pub mod badge;
pub mod menu;
pub mod poweroff;
pub mod registry;

pub use badge::{BadgeApp, BadgeStatus};
pub use menu::MenuApp;
pub use poweroff::PowerOffApp;
pub use registry::*;

use heapless::String;
use log::warn;
use octobadge_hal::{StorageError, StorageKey};

use crate::config::ConfigError;
use crate::runtime::{Context, Platform};

/// Maximum app path length
pub const MAX_PATH_LEN: usize = 64;

/// Storage path identifying an app, e.g. `/system/apps/badge`
pub type AppPath = String<MAX_PATH_LEN>;

/// Build an [`AppPath`]; empty if `path` does not fit
pub fn path_from(path: &str) -> AppPath {
    let mut out = AppPath::new();
    let _ = out.push_str(path);
    out
}

/// What the frame scheduler does after an update
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signal {
    /// Run another tick of the same app
    Continue,
    /// Leave the app; the chooser runs next
    Stop,
    /// Leave the app; the app at this path runs next
    SwitchTo(AppPath),
}

impl Signal {
    /// Switch to `path`, or stop if it does not fit an [`AppPath`]
    pub fn switch_to(path: &str) -> Self {
        let mut target = AppPath::new();
        match target.push_str(path) {
            Ok(()) => Signal::SwitchTo(target),
            Err(_) => {
                warn!("App path too long: {}", path);
                Signal::Stop
            }
        }
    }
}

/// Errors from app hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppError {
    /// Storage operation failed
    Storage(StorageError),
    /// Configuration or credentials could not be loaded
    Config(ConfigError),
    /// Required hardware or service is not available
    Unavailable,
    /// App-specific failure
    Failed(&'static str),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Storage(e)
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

/// An app driven by the supervisor
pub trait App<P: Platform> {
    /// Called once before the first update
    fn init(&mut self, _ctx: &mut Context<P>) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once per frame tick, after input was polled
    fn update(&mut self, ctx: &mut Context<P>) -> Signal;

    /// Called once after the last update, also when HOME interrupts the app
    fn on_exit(&mut self, _ctx: &mut Context<P>) -> Result<(), AppError> {
        Ok(())
    }

    /// File left half written if the app stopped right now
    ///
    /// Read after every update. The reset path removes it when the HOME
    /// interrupt preempts the frame loop before `on_exit` can run.
    fn pending_artifact(&self) -> Option<StorageKey> {
        None
    }
}
