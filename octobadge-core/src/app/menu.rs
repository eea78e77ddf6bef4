//! App chooser
//!
//! Shows the listed apps in a 3x2 grid, one page at a time.
//!
//! - C / A: next / previous app
//! - Down / Up: one row down / up
//! - B: launch the selected app
//! - Hold A + C: power off
//!
//! Moving past either end of a page flips to the neighbouring page,
//! wrapping around at the first and last page.

use core::cmp::Ordering;

use heapless::Vec;
use log::info;
use octobadge_hal::{Button, ButtonSet, SystemControl};

use super::{App, AppError, Signal, MAX_APPS};
use crate::runtime::{AppListing, Context, Platform};

/// Grid columns
pub const COLS: usize = 3;

/// Grid rows
pub const ROWS: usize = 2;

/// Apps per page
pub const APPS_PER_PAGE: usize = COLS * ROWS;

/// Chord that powers the badge off from the menu
pub const POWER_OFF_CHORD: ButtonSet = ButtonSet::of(&[Button::A, Button::C]);

/// Chooser app state
#[derive(Debug, Default)]
pub struct MenuApp {
    entries: Vec<AppListing, MAX_APPS>,
    page: usize,
    active: usize,
}

impl MenuApp {
    /// Menu over `listings`, sorted by label ignoring case
    pub fn with_listings(listings: &[AppListing]) -> Self {
        let mut entries: Vec<AppListing, MAX_APPS> = listings.iter().copied().take(MAX_APPS).collect();
        entries.sort_unstable_by(|a, b| compare_labels(a.label, b.label));
        Self {
            entries,
            page: 0,
            active: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.entries.len().div_ceil(APPS_PER_PAGE).max(1)
    }

    /// Current page, from 0
    pub fn page(&self) -> usize {
        self.page
    }

    /// Selected slot on the current page
    pub fn active(&self) -> usize {
        self.active
    }

    /// Apps on the current page
    pub fn page_entries(&self) -> &[AppListing] {
        let start = (self.page * APPS_PER_PAGE).min(self.entries.len());
        let end = (start + APPS_PER_PAGE).min(self.entries.len());
        &self.entries[start..end]
    }

    pub fn selected(&self) -> Option<&AppListing> {
        self.page_entries().get(self.active)
    }

    fn page_len(&self, page: usize) -> usize {
        self.entries
            .len()
            .saturating_sub(page * APPS_PER_PAGE)
            .min(APPS_PER_PAGE)
    }

    /// Move the selection by `delta` slots
    pub fn navigate(&mut self, delta: isize) {
        let len = self.page_len(self.page) as isize;
        let target = self.active as isize + delta;
        let last_page = self.page_count() - 1;

        if target >= len {
            self.page = if self.page < last_page { self.page + 1 } else { 0 };
            self.active = 0;
        } else if target < 0 {
            self.page = if self.page > 0 { self.page - 1 } else { last_page };
            self.active = self.page_len(self.page).saturating_sub(1);
        } else {
            self.active = target as usize;
        }
    }
}

fn compare_labels(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

impl<P: Platform> App<P> for MenuApp {
    fn init(&mut self, ctx: &mut Context<P>) -> Result<(), AppError> {
        *self = Self::with_listings(ctx.catalog());
        info!("Menu: {} apps, {} pages", self.entries.len(), self.page_count());
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<P>) -> Signal {
        let input = ctx.input();

        if input.chord_held(POWER_OFF_CHORD) {
            info!("Powering off from menu");
            ctx.board.system.deep_sleep();
        }

        let mut delta: isize = 0;
        if input.was_pressed(Button::C) {
            delta += 1;
        }
        if input.was_pressed(Button::A) {
            delta -= 1;
        }
        if input.was_pressed(Button::Up) {
            delta -= COLS as isize;
        }
        if input.was_pressed(Button::Down) {
            delta += COLS as isize;
        }
        if delta != 0 {
            self.navigate(delta);
        }

        if input.was_pressed(Button::B) {
            if let Some(listing) = self.selected() {
                return Signal::switch_to(listing.path);
            }
        }

        Signal::Continue
    }
}
