//! Octobadge Hardware Abstraction Layer
//!
//! This crate defines the traits the badge runtime needs from a board. The
//! same cooperative runtime then runs on the badge itself and on a desktop
//! host (tests, simulators).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Runtime (octobadge-core)               │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  octobadge-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  board crate  │       │ octobadge-hal-│
//! │   (RP2350)    │       │      std      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`storage::FileStorage`] - Durable files (boot flag, cache artifacts)
//! - [`gpio::InputPin`] - Raw line level of the HOME button
//! - [`input::Buttons`] - Button matrix polled once per frame
//! - [`net::Transport`], [`net::ByteStream`], [`net::NetworkLink`] - Network
//! - [`system::Clock`], [`system::SystemControl`] - Time, reset, sleep

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod input;
pub mod net;
pub mod storage;
pub mod system;

// Re-export key traits at crate root for convenience
pub use gpio::{ActiveLowButton, InputPin};
pub use input::{Button, ButtonSet, Buttons, HomeHandler, InputState};
pub use net::{ByteStream, Header, NetError, NetworkLink, Transport};
pub use storage::{FileStorage, StorageError, StorageKey};
pub use system::{Clock, SystemControl};
