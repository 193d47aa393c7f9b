//! Unified error types for the heat-pump controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform. All variants are `Copy`.
//! Safety faults are not errors: they live in the supervisor's bitmask.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor or digital input could not be read.
    Sensor(SensorError),
    /// An output could not be switched.
    Actuator(ActuatorError),
    /// Configuration is invalid.
    Config(&'static str),
    /// A command is not allowed in the current operating mode.
    Rejected(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Rejected(msg) => write!(f, "rejected: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::Corrupted => Self::Config("config document corrupted"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error.
    AdcReadFailed,
    /// A digital input pin could not be sampled.
    GpioReadFailed,
    /// NTC reading outside the physically plausible range (open/short).
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
    /// The requested output combination is forbidden (e.g. both contactors).
    Interlock,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::Interlock => write!(f, "output interlock violated"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Safety faults trigger an immediate transition to an error state and
/// switch the compressor off. They are accumulated in a bitfield by the
/// safety supervisor so that simultaneous faults are tracked and cleared
/// individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[repr(u8)]
pub enum SafetyFault {
    /// Low-pressure switch (ND) tripped while running.
    LowPressure = 0b0000_0001,
    /// High-pressure switch (HD) tripped.
    HighPressure = 0b0000_0010,
    /// Compressor motor protection switch tripped.
    MotorProtection = 0b0000_0100,
    /// Contactor feedback does not match the commanded position.
    ContactorFeedback = 0b0000_1000,
}

impl SafetyFault {
    pub const ALL: [SafetyFault; 4] = [
        Self::LowPressure,
        Self::HighPressure,
        Self::MotorProtection,
        Self::ContactorFeedback,
    ];

    /// Faults of the refrigerant circuit (route to `ERROR_P`).
    pub const PRESSURE_MASK: u8 = Self::LowPressure.mask() | Self::HighPressure.mask();
    /// Faults of the compressor machine (route to `ERROR_M`).
    pub const MACHINE_MASK: u8 = Self::MotorProtection.mask() | Self::ContactorFeedback.mask();

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowPressure => write!(f, "low pressure"),
            Self::HighPressure => write!(f, "high pressure"),
            Self::MotorProtection => write!(f, "motor protection tripped"),
            Self::ContactorFeedback => write!(f, "contactor feedback mismatch"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
