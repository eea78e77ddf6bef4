//! Board-agnostic runtime for the conference badge
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - App contract, static app registry and the built-in apps
//! - Frame scheduler and app lifecycle supervisor
//! - Interrupt-driven reset path and the one-shot boot flag
//! - Resumable, chunked fetch tasks
//! - Profile model and its data refresh orchestrator
//! - Configuration type definitions and loaders

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod app;
pub mod config;
pub mod fetch;
pub mod profile;
pub mod runtime;
pub mod storage;

#[cfg(test)]
pub(crate) mod mock;
