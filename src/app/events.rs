//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them.

use serde::Serialize;

use crate::charging::ChargeState;
use crate::control::ReglerState;
use crate::error::ActuatorError;
use crate::fsm::WpState;
use crate::sensors::temperature::Temperatures;
use crate::status::OperatingMode;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The heat-pump FSM transitioned between states.
    StateChanged { from: WpState, to: WpState },

    /// Storage charging changed state.
    ChargeStateChanged { from: ChargeState, to: ChargeState },

    /// Heating circuit changed state.
    CircuitStateChanged { from: ReglerState, to: ReglerState },

    /// One or more new safety faults were raised; carries the full mask.
    FaultDetected(u8),

    /// All safety faults have been cleared.
    FaultCleared,

    /// Operating mode changed.
    ModeChanged(OperatingMode),

    /// Outputs could not be applied; everything was switched off.
    ActuatorFailure(ActuatorError),

    /// The application service has started (carries initial state).
    Started(WpState),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryData {
    pub hp_state: WpState,
    pub charge_state: ChargeState,
    pub circuit_state: ReglerState,
    pub mode: OperatingMode,
    pub temps: Temperatures,
    pub flow_setpoint_c: f32,
    pub storage_setpoint_c: f32,
    /// Packed `SystemStatus` word.
    pub status_bits: u16,
    /// Packed `DiStates` byte.
    pub di_bits: u8,
    pub fault_flags: u8,
    pub restart_lock_secs: u32,
}
