//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules of the heat-pump controller:
//! heat-pump FSM orchestration, safety evaluation, storage charging and
//! the heating circuit. All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
