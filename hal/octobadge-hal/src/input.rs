//! Button input abstractions
//!
//! Boards report which buttons are held right now; edge detection is done
//! here so every board gets the same just-pressed / just-released semantics.

/// Badge buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Button {
    A = 0,
    B = 1,
    C = 2,
    Up = 3,
    Down = 4,
    Left = 5,
    Right = 6,
    /// Wired to the reset-path interrupt as well as the matrix
    Home = 7,
}

impl Button {
    const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of buttons packed into a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonSet(u8);

impl ButtonSet {
    /// No buttons
    pub const EMPTY: ButtonSet = ButtonSet(0);

    /// Build a set from a list of buttons
    pub const fn of(buttons: &[Button]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < buttons.len() {
            bits |= buttons[i].mask();
            i += 1;
        }
        ButtonSet(bits)
    }

    /// Raw bitmask (bit n = `Button` discriminant n)
    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        ButtonSet(bits)
    }

    pub const fn contains(self, button: Button) -> bool {
        self.0 & button.mask() != 0
    }

    /// True if every button in `other` is in this set
    pub const fn contains_all(self, other: ButtonSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, button: Button) {
        self.0 |= button.mask();
    }

    pub fn remove(&mut self, button: Button) {
        self.0 &= !button.mask();
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Buttons in this set but not in `other`
    pub const fn difference(self, other: ButtonSet) -> Self {
        ButtonSet(self.0 & !other.0)
    }
}

/// Input snapshot for one frame tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputState {
    /// Buttons currently held down
    pub held: ButtonSet,
    /// Buttons that went down since the previous poll
    pub pressed: ButtonSet,
    /// Buttons that went up since the previous poll
    pub released: ButtonSet,
}

impl InputState {
    /// Derive the next snapshot from the raw held set of a new poll
    pub fn advance(self, held: ButtonSet) -> Self {
        Self {
            held,
            pressed: held.difference(self.held),
            released: self.held.difference(held),
        }
    }

    pub fn is_held(&self, button: Button) -> bool {
        self.held.contains(button)
    }

    pub fn was_pressed(&self, button: Button) -> bool {
        self.pressed.contains(button)
    }

    /// True while every button of a chord is held
    pub fn chord_held(&self, chord: ButtonSet) -> bool {
        !chord.is_empty() && self.held.contains_all(chord)
    }
}

/// Function run on the HOME falling edge
///
/// Runs in interrupt context on the badge, so it reaches its state through
/// `static`s.
pub type HomeHandler = fn();

/// Button matrix
///
/// Polled once per frame tick by the frame scheduler.
pub trait Buttons {
    /// Read the set of buttons currently held down
    fn read(&mut self) -> ButtonSet;

    /// Bind the HOME falling-edge interrupt to `handler`
    ///
    /// Called exactly once by the supervisor before the first app runs.
    fn arm_home_interrupt(&mut self, handler: HomeHandler);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_operations() {
        let mut set = ButtonSet::of(&[Button::A, Button::C]);
        assert!(set.contains(Button::A));
        assert!(!set.contains(Button::B));
        assert!(set.contains_all(ButtonSet::of(&[Button::C])));

        set.remove(Button::A);
        set.insert(Button::Home);
        assert_eq!(set, ButtonSet::of(&[Button::C, Button::Home]));
        assert!(ButtonSet::EMPTY.is_empty());
    }

    #[test]
    fn test_edges() {
        let first = InputState::default().advance(ButtonSet::of(&[Button::B]));
        assert!(first.was_pressed(Button::B));
        assert!(first.is_held(Button::B));

        let second = first.advance(ButtonSet::of(&[Button::B]));
        assert!(!second.was_pressed(Button::B));
        assert!(second.is_held(Button::B));

        let third = second.advance(ButtonSet::EMPTY);
        assert!(third.released.contains(Button::B));
        assert!(third.held.is_empty());
    }

    #[test]
    fn test_chord() {
        let chord = ButtonSet::of(&[Button::A, Button::C]);
        let state = InputState::default().advance(ButtonSet::of(&[Button::A]));
        assert!(!state.chord_held(chord));

        let state = state.advance(ButtonSet::of(&[Button::A, Button::C, Button::Up]));
        assert!(state.chord_held(chord));
        assert!(!state.chord_held(ButtonSet::EMPTY));
    }
}
