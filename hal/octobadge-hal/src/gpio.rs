//! GPIO pin abstractions
//!
//! The reset path reads the HOME line directly instead of going through the
//! debounced button matrix, because it runs from the edge interrupt while the
//! frame loop is suspended.

/// Digital input pin
///
/// Implementations should handle the actual hardware register reading
/// for the specific chip.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// Active-low push button wired to an [`InputPin`]
///
/// Badge buttons pull the line to ground while pressed.
pub trait ActiveLowButton: InputPin {
    /// Button is currently pressed
    fn is_pressed(&self) -> bool {
        self.is_low()
    }

    /// Button is currently released
    fn is_released(&self) -> bool {
        self.is_high()
    }
}

// Blanket implementation for every input pin
impl<T: InputPin> ActiveLowButton for T {}
