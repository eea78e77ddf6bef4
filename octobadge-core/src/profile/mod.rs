//! GitHub profile data
//!
//! The [`ProfileModel`] holds what the badge displays; the
//! [`RefreshOrchestrator`] fills it from cache artifacts or the network,
//! one bounded step per frame tick.

pub mod endpoints;
pub mod model;
pub mod orchestrator;
pub mod parse;

pub use model::*;
pub use orchestrator::*;
pub use parse::ParseError;
