//! Storage charging state machine.
//!
//! Turns storage tank demand into requests for the heat pump and owns the
//! charge pump. A charge cycle also schedules the periodic defrost: when it
//! is cold outside and the compressor has been charging for
//! `max_charge_secs` since start or the last defrost, a defrost is
//! requested for `defrost_duration_secs` of actual defrost time.
//!
//! ```text
//!  IDLE ──[storage low]──▶ LADEN ──[storage reached / lock / hp error]──▶ STOP
//!                           │  ▲                                          │
//!                 [cold, long run]  [defrost done]                [pump overrun]
//!                           ▼  │                                          ▼
//!                          DEFROST                     IDLE ◀──[lockout over]── GESPERRT
//! ```

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::fsm::{WpRequest, WpState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChargeState {
    #[default]
    Idle,
    Laden,
    Stop,
    Defrost,
    /// Waiting for the heat pump's restart lockout.
    Gesperrt,
}

/// Inputs sampled for one charging step.
#[derive(Debug, Clone, Copy)]
pub struct ChargeInputs {
    pub storage_c: f32,
    pub outdoor_c: f32,
    pub tariff_lock: bool,
    /// Heat-pump state as of the previous control tick.
    pub hp_state: WpState,
    pub restart_locked: bool,
    /// False when the operating mode does not allow charging.
    pub enabled: bool,
}

/// Result of one charging step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeOutput {
    pub request: WpRequest,
    pub charge_pump: bool,
}

pub struct StorageCharging {
    state: ChargeState,
    secs_in_state: f32,
    /// Compressor charging time since start or last defrost.
    charge_secs: f32,
    /// Time actually spent in heat-pump DEFROST during this defrost cycle.
    defrost_secs: f32,
    setpoint_c: f32,
}

impl Default for StorageCharging {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageCharging {
    pub fn new() -> Self {
        Self {
            state: ChargeState::Idle,
            secs_in_state: 0.0,
            charge_secs: 0.0,
            defrost_secs: 0.0,
            setpoint_c: 0.0,
        }
    }

    pub fn state(&self) -> ChargeState {
        self.state
    }

    /// Storage setpoint used in the last step.
    pub fn setpoint_c(&self) -> f32 {
        self.setpoint_c
    }

    /// Storage setpoint for a given flow setpoint.
    pub fn charge_setpoint(flow_setpoint_c: f32, cfg: &SystemConfig) -> f32 {
        (flow_setpoint_c + cfg.charge_margin_c).max(cfg.storage_min_c)
    }

    /// Advance by one control tick.
    pub fn update(
        &mut self,
        flow_setpoint_c: f32,
        inputs: &ChargeInputs,
        cfg: &SystemConfig,
        dt_secs: f32,
    ) -> ChargeOutput {
        self.setpoint_c = Self::charge_setpoint(flow_setpoint_c, cfg);
        self.secs_in_state += dt_secs;

        if let Some(next) = self.next_state(inputs, cfg, dt_secs) {
            self.enter(next);
        }

        let (request, charge_pump) = match self.state {
            ChargeState::Idle => (WpRequest::Idle, false),
            ChargeState::Laden => (WpRequest::Laden, true),
            ChargeState::Defrost => (WpRequest::Defrost, true),
            ChargeState::Stop => (WpRequest::Halt, true),
            ChargeState::Gesperrt => (WpRequest::Idle, false),
        };
        ChargeOutput {
            request,
            charge_pump,
        }
    }

    fn next_state(
        &mut self,
        inputs: &ChargeInputs,
        cfg: &SystemConfig,
        dt_secs: f32,
    ) -> Option<ChargeState> {
        let blocked = inputs.tariff_lock || !inputs.enabled || inputs.hp_state.is_error();
        match self.state {
            ChargeState::Idle => {
                let demand = inputs.storage_c < self.setpoint_c - cfg.charge_hysteresis_c;
                (demand && !blocked && !inputs.restart_locked).then_some(ChargeState::Laden)
            }
            ChargeState::Laden => {
                if blocked || inputs.storage_c >= self.setpoint_c {
                    return Some(ChargeState::Stop);
                }
                if inputs.hp_state == WpState::Run {
                    self.charge_secs += dt_secs;
                }
                let cold = inputs.outdoor_c < cfg.defrost_required_below_c;
                (cold && self.charge_secs >= cfg.max_charge_secs as f32)
                    .then_some(ChargeState::Defrost)
            }
            ChargeState::Defrost => {
                if blocked {
                    return Some(ChargeState::Stop);
                }
                if inputs.hp_state == WpState::Defrost {
                    self.defrost_secs += dt_secs;
                }
                let done = self.defrost_secs >= f32::from(cfg.defrost_duration_secs);
                let stuck = self.secs_in_state >= f32::from(cfg.defrost_max_secs);
                if done || stuck {
                    self.charge_secs = 0.0;
                    return Some(ChargeState::Laden);
                }
                None
            }
            ChargeState::Stop => (self.secs_in_state >= cfg.charge_pump_overrun_secs as f32)
                .then_some(ChargeState::Gesperrt),
            ChargeState::Gesperrt => (!inputs.restart_locked && !inputs.hp_state.is_error())
                .then_some(ChargeState::Idle),
        }
    }

    fn enter(&mut self, next: ChargeState) {
        info!("charging: {:?} -> {:?}", self.state, next);
        match next {
            ChargeState::Laden if self.state != ChargeState::Defrost => self.charge_secs = 0.0,
            ChargeState::Defrost => self.defrost_secs = 0.0,
            _ => {}
        }
        self.state = next;
        self.secs_in_state = 0.0;
    }
}
