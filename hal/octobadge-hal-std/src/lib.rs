//! Host HAL for Octobadge
//!
//! Implements the `octobadge-hal` traits on top of the standard library so
//! the runtime can be driven from a desktop:
//!
//! - [`DirStorage`]: badge files mapped into a directory
//! - [`UreqTransport`]: blocking HTTPS through `ureq`
//! - [`HostLink`]: the host's own network, always up
//! - [`SystemClock`] and [`ProcessControl`]: time and power
//! - [`KeyboardButtons`] and [`HomeLine`]: buttons typed on stdin

#![deny(unsafe_code)]

pub mod input;
pub mod net;
pub mod storage;
pub mod system;

pub use input::{HomeLine, KeyboardButtons};
pub use net::{HostLink, UreqStream, UreqTransport};
pub use storage::DirStorage;
pub use system::{ProcessControl, SystemClock, RESTART_EXIT_CODE};
