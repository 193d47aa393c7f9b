//! Heating-circuit control: heating curve, mixer controller and the
//! circuit state machine.

pub mod heating_curve;
pub mod regler;
pub mod tristate;

pub use heating_curve::{HeatingCurve, calc_flow_setpoint};
pub use regler::{CircuitInputs, CircuitOutputs, HeatingCircuit, ReglerState};
pub use tristate::{MixerDrive, TristateController};
