//! Hardware adapter: bridges the input and relay banks to domain port traits.
//!
//! Owns the [`SensorHub`] and the [`RelayOutputs`], exposing them through
//! [`SensorPort`] and [`ActuatorPort`]. Generic over `embedded-hal` pins so
//! the same adapter drives the raw-GPIO pins from `io::hw_init` on target
//! and simulated pins in host tests.

use embedded_hal::digital::{InputPin, OutputPin};
use log::error;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::error::ActuatorError;
use crate::fsm::context::SensorSnapshot;
use crate::io::{Outputs, RelayOutputs};
use crate::sensors::SensorHub;

/// Concrete adapter that combines all controller I/O behind port traits.
pub struct HardwareAdapter<I, O> {
    sensor_hub: SensorHub<I>,
    relays: RelayOutputs<O>,
}

impl<I: InputPin, O: OutputPin> HardwareAdapter<I, O> {
    pub fn new(sensor_hub: SensorHub<I>, relays: RelayOutputs<O>) -> Self {
        Self { sensor_hub, relays }
    }

    /// Output word last written to the relays.
    pub fn relay_state(&self) -> Outputs {
        self.relays.current()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I: InputPin, O: OutputPin> SensorPort for HardwareAdapter<I, O> {
    fn read_all(&mut self) -> SensorSnapshot {
        self.sensor_hub.read_all()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I: InputPin, O: OutputPin> ActuatorPort for HardwareAdapter<I, O> {
    fn apply(&mut self, outputs: &Outputs) -> Result<(), ActuatorError> {
        self.relays.apply(outputs)
    }

    fn all_off(&mut self) {
        if let Err(e) = self.relays.all_off() {
            error!("relay all-off failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sim::SimPin;
    use crate::io::{DI_COUNT, DO_COUNT, DigitalInputs};

    fn adapter() -> (HardwareAdapter<SimPin, SimPin>, [SimPin; DO_COUNT]) {
        let inputs: [SimPin; DI_COUNT] = core::array::from_fn(|_| SimPin::new(false));
        let outputs: [SimPin; DO_COUNT] = core::array::from_fn(|_| SimPin::new(false));
        let handles = outputs.clone();
        let hub = SensorHub::new(DigitalInputs::new(inputs), |_| Some(2048));
        (HardwareAdapter::new(hub, RelayOutputs::new(outputs)), handles)
    }

    #[test]
    fn apply_reaches_the_relays() {
        let (mut hw, relays) = adapter();
        let out = Outputs { fan: true, ..Outputs::all_off() };
        hw.apply(&out).unwrap();
        assert_eq!(hw.relay_state(), out);
        assert_eq!(relays.iter().filter(|p| p.level()).count(), 1);
    }

    #[test]
    fn interlock_violation_switches_off() {
        let (mut hw, relays) = adapter();
        let bad = Outputs { k_start: true, k_run: true, ..Outputs::all_off() };
        assert_eq!(hw.apply(&bad), Err(ActuatorError::Interlock));
        assert!(relays.iter().all(|p| !p.level()));
    }

    #[test]
    fn read_all_samples_inputs_and_temperatures() {
        let (mut hw, _) = adapter();
        let snap = hw.read_all();
        assert!(snap.inputs_ok && snap.temps_ok);
    }
}
