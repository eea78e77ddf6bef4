//! Time and power control

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed epoch (usually boot)
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `since_ms`
    fn elapsed_ms(&self, since_ms: u64) -> u64 {
        self.now_ms().saturating_sub(since_ms)
    }
}

/// Whole-device control
pub trait SystemControl {
    /// Hard reset; execution restarts from boot
    fn reset(&mut self) -> !;

    /// Enter the lowest power state; only RESET or a button wakes the device
    fn deep_sleep(&mut self) -> !;
}
