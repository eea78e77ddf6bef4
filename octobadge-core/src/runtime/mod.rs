//! Cooperative runtime
//!
//! Single-threaded: the supervisor runs one app at a time through the
//! frame scheduler. The only asynchronous input is the HOME interrupt,
//! which reaches the loop through [`ResetSignal`].

pub mod boot;
pub mod context;
pub mod reset;
pub mod scheduler;
pub mod supervisor;

pub use boot::BootFlag;
pub use context::{AppListing, Board, Context, Platform};
pub use reset::{ResetPath, ResetSignal};
pub use scheduler::{FrameExit, FrameScheduler};
pub use supervisor::{Phase, Supervisor, SupervisorState, Transition};
