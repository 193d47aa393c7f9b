//! Digital input reader: eight opto-isolated inputs packed into [`DiStates`].
//!
//! The inputs see a mix of normally-closed protective contacts (pressure
//! switches, motor protection) and normally-open auxiliary contacts. The
//! per-input polarity table below normalises them so that `true` always
//! means "tripped", "closed" or "active".

use embedded_hal::digital::InputPin;
use log::warn;
use serde::{Deserialize, Serialize};

use super::DI_COUNT;
use crate::error::SensorError;

/// Snapshot of the eight digital inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiStates {
    /// Bit 0: low-pressure switch (ND) tripped.
    pub low_pressure: bool,
    /// Bit 1: high-pressure switch (HD) tripped.
    pub high_pressure: bool,
    /// Bit 2: compressor motor protection tripped.
    pub motor_protection: bool,
    /// Bit 3: start contactor reports closed.
    pub k_start: bool,
    /// Bit 4: run contactor reports closed.
    pub k_run: bool,
    /// Bit 5: utility tariff lock active.
    pub tariff_lock: bool,
    /// Bit 6: reserve.
    pub reserve1: bool,
    /// Bit 7: reserve.
    pub reserve2: bool,
}

impl DiStates {
    fn as_array(&self) -> [bool; DI_COUNT] {
        [
            self.low_pressure,
            self.high_pressure,
            self.motor_protection,
            self.k_start,
            self.k_run,
            self.tariff_lock,
            self.reserve1,
            self.reserve2,
        ]
    }

    fn from_array(a: [bool; DI_COUNT]) -> Self {
        Self {
            low_pressure: a[0],
            high_pressure: a[1],
            motor_protection: a[2],
            k_start: a[3],
            k_run: a[4],
            tariff_lock: a[5],
            reserve1: a[6],
            reserve2: a[7],
        }
    }

    /// Pack into a byte, bit 0 = low pressure … bit 7 = reserve 2.
    pub fn bits(&self) -> u8 {
        self.as_array()
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &on)| acc | (u8::from(on) << i))
    }

    pub fn from_bits(bits: u8) -> Self {
        Self::from_array(core::array::from_fn(|i| bits & (1 << i) != 0))
    }
}

/// Electrical level that means "active" for each input, in bit order.
///
/// Protective contacts open on a fault and the opto-coupler then pulls the
/// pin HIGH; closed auxiliary contacts pull it LOW.
const ACTIVE_HIGH: [bool; DI_COUNT] = [true, true, true, false, false, false, false, false];

/// Reader for the digital input bank.
pub struct DigitalInputs<P> {
    pins: [P; DI_COUNT],
    last: DiStates,
}

impl<P: InputPin> DigitalInputs<P> {
    pub fn new(pins: [P; DI_COUNT]) -> Self {
        Self {
            pins,
            last: DiStates::default(),
        }
    }

    /// Sample every input and return the normalised snapshot.
    ///
    /// On a pin error the previous snapshot is kept and the error returned;
    /// the caller decides whether to run on the stale value.
    pub fn get_dio_states(&mut self) -> Result<DiStates, SensorError> {
        let mut levels = [false; DI_COUNT];
        for (i, pin) in self.pins.iter_mut().enumerate() {
            let high = pin.is_high().map_err(|_| {
                warn!("DI{}: read failed, keeping previous snapshot", i);
                SensorError::GpioReadFailed
            })?;
            levels[i] = high == ACTIVE_HIGH[i];
        }
        self.last = DiStates::from_array(levels);
        Ok(self.last)
    }

    /// Last successfully sampled snapshot.
    pub fn last(&self) -> DiStates {
        self.last
    }
}
