//! Keyboard-driven buttons
//!
//! Each line typed on stdin is one press: `a`, `up`, or a chord such as
//! `a+c`. The press is held for one frame and released on the next.
//! `home` does not go through the matrix; it runs the bound HOME handler on
//! the reader thread, the way a second core would take the edge interrupt.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};
use octobadge_hal::{Button, ButtonSet, Buttons, HomeHandler, InputPin};

/// Default frame period of the host loop
pub const DEFAULT_FRAME: Duration = Duration::from_millis(33);

#[derive(Debug, Default)]
struct KeyState {
    presses: VecDeque<ButtonSet>,
    home: Option<HomeHandler>,
}

/// What a typed line asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLine {
    Press(ButtonSet),
    Home,
    Ignored,
}

/// Parse one typed line
pub fn parse_line(line: &str) -> KeyLine {
    let mut set = ButtonSet::EMPTY;
    for name in line.split('+').map(str::trim).filter(|n| !n.is_empty()) {
        let button = match name.to_ascii_lowercase().as_str() {
            "a" => Button::A,
            "b" => Button::B,
            "c" => Button::C,
            "up" | "u" => Button::Up,
            "down" | "d" => Button::Down,
            "left" | "l" => Button::Left,
            "right" | "r" => Button::Right,
            "home" | "h" => return KeyLine::Home,
            _ => return KeyLine::Ignored,
        };
        set.insert(button);
    }
    if set.is_empty() {
        KeyLine::Ignored
    } else {
        KeyLine::Press(set)
    }
}

/// Button matrix fed from the terminal
///
/// `read` sleeps for one frame period, which paces the frame loop.
#[derive(Debug, Clone)]
pub struct KeyboardButtons {
    state: Arc<Mutex<KeyState>>,
    frame: Duration,
}

fn lock(state: &Mutex<KeyState>) -> MutexGuard<'_, KeyState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl KeyboardButtons {
    pub fn new(frame: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(KeyState::default())),
            frame,
        }
    }

    /// Apply one typed line
    pub fn feed_line(&self, line: &str) {
        match parse_line(line) {
            KeyLine::Press(set) => lock(&self.state).presses.push_back(set),
            KeyLine::Home => {
                // Copy out so the handler runs without the lock held
                let home = lock(&self.state).home;
                match home {
                    Some(handler) => handler(),
                    None => warn!("HOME pressed before the interrupt was armed"),
                }
            }
            KeyLine::Ignored => {
                if !line.trim().is_empty() {
                    warn!("Unknown key {:?}", line.trim());
                }
            }
        }
    }

    /// Feed stdin lines from a background thread until EOF
    pub fn spawn_stdin_reader(&self) -> io::Result<JoinHandle<()>> {
        let keys = self.clone();
        thread::Builder::new()
            .name("keyboard".into())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    match line {
                        Ok(line) => keys.feed_line(&line),
                        Err(e) => {
                            warn!("stdin closed: {}", e);
                            break;
                        }
                    }
                }
                debug!("Keyboard reader finished");
            })
    }
}

impl Default for KeyboardButtons {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME)
    }
}

impl Buttons for KeyboardButtons {
    fn read(&mut self) -> ButtonSet {
        if !self.frame.is_zero() {
            thread::sleep(self.frame);
        }
        lock(&self.state)
            .presses
            .pop_front()
            .unwrap_or(ButtonSet::EMPTY)
    }

    fn arm_home_interrupt(&mut self, handler: HomeHandler) {
        debug!("HOME bound to the keyboard");
        lock(&self.state).home = Some(handler);
    }
}

/// HOME line as seen by the reset path
///
/// A terminal only delivers a line once it was typed, so the key always
/// reads released by the time the handler runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomeLine;

impl InputPin for HomeLine {
    fn is_high(&self) -> bool {
        true
    }
}
