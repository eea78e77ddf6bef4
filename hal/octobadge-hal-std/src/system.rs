//! Host time and power control

use std::process;
use std::time::Instant;

use log::info;
use octobadge_hal::{Clock, SystemControl};

/// Exit code asking a wrapper script to start the runtime again
pub const RESTART_EXIT_CODE: i32 = 75;

/// Monotonic clock counting from construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Ends the process in place of a device reset or power-off
///
/// A reset exits with [`RESTART_EXIT_CODE`] so a supervisor process can
/// relaunch; deep sleep exits cleanly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessControl;

impl SystemControl for ProcessControl {
    fn reset(&mut self) -> ! {
        info!("Reset requested, exiting with {}", RESTART_EXIT_CODE);
        process::exit(RESTART_EXIT_CODE)
    }

    fn deep_sleep(&mut self) -> ! {
        info!("Deep sleep requested, exiting");
        process::exit(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = clock.now_ms();
        assert!(second >= first + 5);
        assert!(clock.elapsed_ms(first) >= 5);
    }
}
