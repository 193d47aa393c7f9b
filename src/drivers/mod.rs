//! Peripheral drivers outside the control I/O banks.

pub mod watchdog;
