//! NTC thermistor temperature channels (10 kOhm @ 25 C, B = 3950).
//!
//! Each probe sits in a voltage divider with a fixed 10 kOhm resistor and is
//! read through ADC1. The simplified Beta equation converts resistance to
//! temperature. A shorted or open probe shows up as a reading outside the
//! plausible range and is reported as [`SensorError::OutOfRange`].

use serde::{Deserialize, Serialize};

use crate::error::SensorError;

const R25: f32 = 10_000.0;
const BETA: f32 = 3950.0;
const T25_K: f32 = 298.15;
const R_DIVIDER: f32 = 10_000.0;
const ADC_MAX: f32 = 4095.0;
const V_REF: f32 = 3.3;

/// Plausible range for any probe on the plant.
pub const MIN_PLAUSIBLE_C: f32 = -40.0;
pub const MAX_PLAUSIBLE_C: f32 = 120.0;

/// All temperature readings in °C, in ADC channel order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperatures {
    pub outdoor_c: f32,
    /// Condenser return.
    pub condenser_c: f32,
    pub storage_c: f32,
    pub flow_c: f32,
}

impl Default for Temperatures {
    /// Mild values that request nothing until real readings arrive.
    fn default() -> Self {
        Self {
            outdoor_c: 15.0,
            condenser_c: 20.0,
            storage_c: 45.0,
            flow_c: 20.0,
        }
    }
}

/// Convert a raw 12-bit ADC sample to °C, `None` for an open/shorted probe.
pub fn adc_to_celsius(raw: u16) -> Option<f32> {
    let voltage = (f32::from(raw) / ADC_MAX) * V_REF;
    if voltage <= 0.01 || voltage >= (V_REF - 0.01) {
        return None;
    }
    let r_ntc = R_DIVIDER * voltage / (V_REF - voltage);
    let inv_t = (1.0 / T25_K) + (1.0 / BETA) * (r_ntc / R25).ln();
    if inv_t <= 0.0 {
        return None;
    }
    let celsius = (1.0 / inv_t) - 273.15;
    (MIN_PLAUSIBLE_C..=MAX_PLAUSIBLE_C)
        .contains(&celsius)
        .then_some(celsius)
}

/// One temperature channel with last-good-value retention.
pub struct TemperatureSensor {
    pub name: &'static str,
    channel: u32,
    last_c: f32,
}

impl TemperatureSensor {
    pub fn new(name: &'static str, channel: u32, initial_c: f32) -> Self {
        Self {
            name,
            channel,
            last_c: initial_c,
        }
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    /// Convert a sample taken from this channel. `None` means the ADC
    /// driver failed.
    pub fn update(&mut self, raw: Option<u16>) -> Result<f32, SensorError> {
        let raw = raw.ok_or(SensorError::AdcReadFailed)?;
        let celsius = adc_to_celsius(raw).ok_or(SensorError::OutOfRange)?;
        self.last_c = celsius;
        Ok(celsius)
    }

    /// Last plausible reading.
    pub fn last(&self) -> f32 {
        self.last_c
    }
}
