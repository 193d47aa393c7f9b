//! Heat-pump controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod charging;
pub mod config;
pub mod control;
pub mod error;
pub mod fsm;
pub mod io;
pub mod pins;
pub mod safety;
pub mod scheduler;
pub mod status;

// The adapters and drivers carry cfg-gated target code; the host build
// compiles their simulation halves.
pub mod adapters;
pub mod drivers;
pub mod sensors;
