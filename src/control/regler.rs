//! Heating-circuit controller.
//!
//! Owns the heating pump and the mixing valve. The state follows the
//! operating mode and what the heat pump is doing:
//!
//! | State   | Pump | Mixer                                   |
//! |---------|------|-----------------------------------------|
//! | OFF     | off  | driven closed for the full travel, then held |
//! | AUTO    | on   | tristate regulation                     |
//! | LADEN   | on   | tristate regulation (charging running)  |
//! | DEFROST | on   | held                                    |
//! | MANUAL  | operator | operator                            |

use log::info;
use serde::{Deserialize, Serialize};

use super::tristate::{MixerDrive, TristateController};
use crate::charging::ChargeState;
use crate::config::SystemConfig;
use crate::fsm::WpState;
use crate::status::OperatingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReglerState {
    #[default]
    Off,
    Auto,
    Manual,
    Laden,
    Defrost,
}

/// Outputs owned by the heating circuit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitOutputs {
    pub heating_pump: bool,
    pub mixer_open: bool,
    pub mixer_close: bool,
    /// Flow temperature controller is regulating.
    pub flow_controller_active: bool,
}

impl CircuitOutputs {
    fn with_drive(heating_pump: bool, drive: MixerDrive, active: bool) -> Self {
        Self {
            heating_pump,
            mixer_open: drive == MixerDrive::Open,
            mixer_close: drive == MixerDrive::Close,
            flow_controller_active: active,
        }
    }
}

/// Per-tick inputs for the heating circuit.
#[derive(Debug, Clone, Copy)]
pub struct CircuitInputs {
    pub mode: OperatingMode,
    pub charge_state: ChargeState,
    pub hp_state: WpState,
    pub flow_setpoint_c: f32,
    pub flow_c: f32,
}

pub struct HeatingCircuit {
    state: ReglerState,
    secs_in_state: f32,
    mixer: TristateController,
    manual: CircuitOutputs,
}

impl HeatingCircuit {
    pub fn new(cfg: &SystemConfig) -> Self {
        Self {
            state: ReglerState::Off,
            secs_in_state: 0.0,
            mixer: TristateController::from_config(cfg),
            manual: CircuitOutputs::default(),
        }
    }

    pub fn state(&self) -> ReglerState {
        self.state
    }

    /// Rebuild the mixer controller after a configuration change.
    pub fn reconfigure(&mut self, cfg: &SystemConfig) {
        self.mixer = TristateController::from_config(cfg);
    }

    /// Outputs to hold while in manual mode. Both mixer directions at
    /// once are dropped to hold.
    pub fn set_manual(&mut self, mut outputs: CircuitOutputs) {
        if outputs.mixer_open && outputs.mixer_close {
            outputs.mixer_open = false;
            outputs.mixer_close = false;
        }
        outputs.flow_controller_active = false;
        self.manual = outputs;
    }

    fn target_state(inputs: &CircuitInputs) -> ReglerState {
        match inputs.mode {
            OperatingMode::Off => ReglerState::Off,
            OperatingMode::Manual => ReglerState::Manual,
            OperatingMode::Auto if inputs.hp_state == WpState::Defrost => ReglerState::Defrost,
            OperatingMode::Auto if inputs.charge_state == ChargeState::Laden => ReglerState::Laden,
            OperatingMode::Auto => ReglerState::Auto,
        }
    }

    pub fn update(&mut self, inputs: &CircuitInputs, cfg: &SystemConfig, dt_secs: f32) -> CircuitOutputs {
        let target = Self::target_state(inputs);
        if target != self.state {
            info!("heating circuit: {:?} -> {:?}", self.state, target);
            self.state = target;
            self.secs_in_state = 0.0;
            self.mixer.reset();
        }

        let out = match self.state {
            ReglerState::Off => {
                let closing = self.secs_in_state < cfg.mixer_travel_secs as f32;
                let drive = if closing { MixerDrive::Close } else { MixerDrive::Hold };
                CircuitOutputs::with_drive(false, drive, false)
            }
            ReglerState::Auto | ReglerState::Laden => {
                let drive = self
                    .mixer
                    .compute(inputs.flow_setpoint_c, inputs.flow_c, dt_secs);
                CircuitOutputs::with_drive(true, drive, self.mixer.is_active())
            }
            ReglerState::Defrost => CircuitOutputs::with_drive(true, MixerDrive::Hold, false),
            ReglerState::Manual => self.manual,
        };
        self.secs_in_state += dt_secs;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(mode: OperatingMode) -> CircuitInputs {
        CircuitInputs {
            mode,
            charge_state: ChargeState::Idle,
            hp_state: WpState::Idle,
            flow_setpoint_c: 40.0,
            flow_c: 30.0,
        }
    }

    #[test]
    fn off_closes_mixer_for_travel_time_then_holds() {
        let cfg = SystemConfig::default();
        let mut hc = HeatingCircuit::new(&cfg);
        let i = inputs(OperatingMode::Off);
        for _ in 0..cfg.mixer_travel_secs {
            let out = hc.update(&i, &cfg, 1.0);
            assert!(out.mixer_close && !out.heating_pump);
        }
        let out = hc.update(&i, &cfg, 1.0);
        assert_eq!(out, CircuitOutputs::default());
    }

    #[test]
    fn auto_runs_pump_and_opens_when_cold() {
        let cfg = SystemConfig::default();
        let mut hc = HeatingCircuit::new(&cfg);
        let out = hc.update(&inputs(OperatingMode::Auto), &cfg, 1.0);
        assert_eq!(hc.state(), ReglerState::Auto);
        assert!(out.heating_pump && out.mixer_open && out.flow_controller_active);
    }

    #[test]
    fn charging_and_defrost_states_follow_plant() {
        let cfg = SystemConfig::default();
        let mut hc = HeatingCircuit::new(&cfg);
        let laden = CircuitInputs { charge_state: ChargeState::Laden, ..inputs(OperatingMode::Auto) };
        hc.update(&laden, &cfg, 1.0);
        assert_eq!(hc.state(), ReglerState::Laden);

        let defrost = CircuitInputs { hp_state: WpState::Defrost, ..laden };
        let out = hc.update(&defrost, &cfg, 1.0);
        assert_eq!(hc.state(), ReglerState::Defrost);
        assert!(out.heating_pump && !out.mixer_open && !out.mixer_close);
    }

    #[test]
    fn manual_outputs_are_passed_through_without_conflict() {
        let cfg = SystemConfig::default();
        let mut hc = HeatingCircuit::new(&cfg);
        hc.set_manual(CircuitOutputs {
            heating_pump: true,
            mixer_open: true,
            mixer_close: true,
            flow_controller_active: true,
        });
        let out = hc.update(&inputs(OperatingMode::Manual), &cfg, 1.0);
        assert_eq!(hc.state(), ReglerState::Manual);
        assert_eq!(out, CircuitOutputs { heating_pump: true, ..CircuitOutputs::default() });
    }
}
