//! Relay output bank.
//!
//! The relays are dumb actuators; the only logic here is the hardware
//! interlock check, which refuses output words that would pull in both
//! compressor contactors or drive the mixer in both directions.

use embedded_hal::digital::{OutputPin, PinState};
use log::error;
use serde::{Deserialize, Serialize};

use super::DO_COUNT;
use crate::error::ActuatorError;

/// Desired state of every relay output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outputs {
    pub crankcase_heater: bool,
    pub k_start: bool,
    pub k_run: bool,
    /// Hot-gas bypass valve open.
    pub bypass: bool,
    pub fan: bool,
    pub charge_pump: bool,
    pub heating_pump: bool,
    pub mixer_open: bool,
    pub mixer_close: bool,
    /// Collective alarm relay.
    pub alarm: bool,
    pub reserve1: bool,
    pub reserve2: bool,
}

impl Outputs {
    /// Every relay de-energised.
    pub fn all_off() -> Self {
        Self::default()
    }

    /// `true` when the word respects the hardware interlocks.
    pub fn interlock_ok(&self) -> bool {
        !(self.k_start && self.k_run) && !(self.mixer_open && self.mixer_close)
    }

    /// Compressor motor energised through either contactor.
    pub fn compressor_on(&self) -> bool {
        self.k_start || self.k_run
    }

    fn as_array(&self) -> [bool; DO_COUNT] {
        [
            self.crankcase_heater,
            self.k_start,
            self.k_run,
            self.bypass,
            self.fan,
            self.charge_pump,
            self.heating_pump,
            self.mixer_open,
            self.mixer_close,
            self.alarm,
            self.reserve1,
            self.reserve2,
        ]
    }
}

/// Driver for the relay bank.
pub struct RelayOutputs<P> {
    pins: [P; DO_COUNT],
    current: Outputs,
}

impl<P: OutputPin> RelayOutputs<P> {
    pub fn new(pins: [P; DO_COUNT]) -> Self {
        Self {
            pins,
            current: Outputs::all_off(),
        }
    }

    /// Drive every relay to the given word.
    ///
    /// A word that violates the interlocks is not applied; the bank is
    /// switched off instead.
    pub fn apply(&mut self, outputs: &Outputs) -> Result<(), ActuatorError> {
        if !outputs.interlock_ok() {
            error!("relay word {:?} violates interlock, switching all off", outputs);
            self.all_off()?;
            return Err(ActuatorError::Interlock);
        }
        self.write(outputs)
    }

    /// De-energise every relay.
    pub fn all_off(&mut self) -> Result<(), ActuatorError> {
        self.write(&Outputs::all_off())
    }

    /// The word last written successfully.
    pub fn current(&self) -> Outputs {
        self.current
    }

    fn write(&mut self, outputs: &Outputs) -> Result<(), ActuatorError> {
        for (pin, on) in self.pins.iter_mut().zip(outputs.as_array()) {
            pin.set_state(PinState::from(on))
                .map_err(|_| ActuatorError::GpioWriteFailed)?;
        }
        self.current = *outputs;
        Ok(())
    }
}
