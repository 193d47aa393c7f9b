//! Aggregate system status word.
//!
//! `SystemStatus` collects what the plant is doing into one record that
//! packs into a 16-bit word for telemetry. Bit positions are fixed:
//!
//! | Bit | Field            | Bit | Field            |
//! |-----|------------------|-----|------------------|
//! | 0   | crankcase_heater | 8   | auto_mode        |
//! | 1   | compressor       | 9   | reduced          |
//! | 2   | fan              | 10  | manual_mode      |
//! | 3   | bypass           | 11  | pressure_low     |
//! | 4   | charge_pump      | 12  | pressure_high    |
//! | 5   | flow_controller  | 13  | motor_protection |
//! | 6   | heating_pump     | 14  | tariff_lock      |
//! | 7   | defrost          | 15  | reserved, 0      |

use serde::{Deserialize, Serialize};

use crate::fsm::WpState;
use crate::io::{DiStates, Outputs};

/// Operating mode selected by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperatingMode {
    /// Plant off: no charging, heating circuit closed down.
    Off,
    #[default]
    Auto,
    /// Operator drives the heat-pump request and circuit outputs.
    Manual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub crankcase_heater: bool,
    pub compressor: bool,
    pub fan: bool,
    pub bypass: bool,
    pub charge_pump: bool,
    pub flow_controller: bool,
    pub heating_pump: bool,
    pub defrost: bool,
    pub auto_mode: bool,
    /// Setback active.
    pub reduced: bool,
    pub manual_mode: bool,
    pub pressure_low: bool,
    pub pressure_high: bool,
    pub motor_protection: bool,
    pub tariff_lock: bool,
}

impl SystemStatus {
    /// Compose the status from applied outputs, inputs and mode.
    pub fn compose(
        outputs: &Outputs,
        di: &DiStates,
        hp_state: WpState,
        mode: OperatingMode,
        reduced: bool,
        flow_controller: bool,
    ) -> Self {
        Self {
            crankcase_heater: outputs.crankcase_heater,
            compressor: outputs.compressor_on(),
            fan: outputs.fan,
            bypass: outputs.bypass,
            charge_pump: outputs.charge_pump,
            flow_controller,
            heating_pump: outputs.heating_pump,
            defrost: hp_state == WpState::Defrost,
            auto_mode: mode == OperatingMode::Auto,
            reduced,
            manual_mode: mode == OperatingMode::Manual,
            pressure_low: di.low_pressure,
            pressure_high: di.high_pressure,
            motor_protection: di.motor_protection,
            tariff_lock: di.tariff_lock,
        }
    }

    fn as_array(&self) -> [bool; 15] {
        [
            self.crankcase_heater,
            self.compressor,
            self.fan,
            self.bypass,
            self.charge_pump,
            self.flow_controller,
            self.heating_pump,
            self.defrost,
            self.auto_mode,
            self.reduced,
            self.manual_mode,
            self.pressure_low,
            self.pressure_high,
            self.motor_protection,
            self.tariff_lock,
        ]
    }

    /// Pack into the status word. Bit 15 is always 0.
    pub fn bits(&self) -> u16 {
        self.as_array()
            .iter()
            .enumerate()
            .fold(0u16, |acc, (i, &on)| acc | (u16::from(on) << i))
    }

    /// Unpack a status word; bit 15 is ignored.
    pub fn from_bits(bits: u16) -> Self {
        let b = |i: u16| bits & (1 << i) != 0;
        Self {
            crankcase_heater: b(0),
            compressor: b(1),
            fan: b(2),
            bypass: b(3),
            charge_pump: b(4),
            flow_controller: b(5),
            heating_pump: b(6),
            defrost: b(7),
            auto_mode: b(8),
            reduced: b(9),
            manual_mode: b(10),
            pressure_low: b(11),
            pressure_high: b(12),
            motor_protection: b(13),
            tariff_lock: b(14),
        }
    }
}
