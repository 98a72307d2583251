//! Two-task traffic light controller.
//!
//! A five-phase, time-driven state machine shared between a control task
//! that advances it and a monitor task that reports on it. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, so the whole crate tests on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod safety;
pub mod scheduler;

mod esp_link_shims;
