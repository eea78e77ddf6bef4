//! Power-off confirmation
//!
//! A / Left selects Cancel, C / Right selects Power Off, B confirms.

use log::info;
use octobadge_hal::{Button, SystemControl};

use super::{App, Signal};
use crate::runtime::{Context, Platform};

/// Confirmation choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Choice {
    #[default]
    Cancel,
    PowerOff,
}

#[derive(Debug, Default)]
pub struct PowerOffApp {
    choice: Choice,
}

impl PowerOffApp {
    pub fn choice(&self) -> Choice {
        self.choice
    }
}

impl<P: Platform> App<P> for PowerOffApp {
    fn update(&mut self, ctx: &mut Context<P>) -> Signal {
        let input = ctx.input();

        if input.was_pressed(Button::A) || input.was_pressed(Button::Left) {
            self.choice = Choice::Cancel;
        }
        if input.was_pressed(Button::C) || input.was_pressed(Button::Right) {
            self.choice = Choice::PowerOff;
        }

        if input.was_pressed(Button::B) {
            match self.choice {
                Choice::Cancel => return Signal::switch_to(&ctx.config.apps.chooser),
                Choice::PowerOff => {
                    info!("Entering deep sleep");
                    ctx.board.system.deep_sleep();
                }
            }
        }

        Signal::Continue
    }
}
