//! Sensor subsystem: temperature channels and the aggregating [`SensorHub`].
//!
//! The hub owns the digital input reader and the four NTC channels and
//! produces a [`SensorSnapshot`] each tick that gets written into
//! `FsmContext.sensors`.

pub mod temperature;

use embedded_hal::digital::InputPin;
use log::warn;

use crate::fsm::context::SensorSnapshot;
use crate::io::DigitalInputs;
use crate::pins;
use temperature::{TemperatureSensor, Temperatures};

/// Raw ADC sampler, `None` on a driver error.
pub type AdcRead = fn(u32) -> Option<u16>;

/// Aggregates the input bank and every temperature channel.
pub struct SensorHub<P> {
    inputs: DigitalInputs<P>,
    probes: [TemperatureSensor; 4],
    read_adc: AdcRead,
}

impl<P: InputPin> SensorHub<P> {
    /// Build the hub around an already set-up input reader (see
    /// [`crate::io::setup_steuer_io`]).
    pub fn new(inputs: DigitalInputs<P>, read_adc: AdcRead) -> Self {
        let d = Temperatures::default();
        Self {
            inputs,
            probes: [
                TemperatureSensor::new("outdoor", pins::ADC1_CH_OUTDOOR, d.outdoor_c),
                TemperatureSensor::new("condenser", pins::ADC1_CH_CONDENSER, d.condenser_c),
                TemperatureSensor::new("storage", pins::ADC1_CH_STORAGE, d.storage_c),
                TemperatureSensor::new("flow", pins::ADC1_CH_FLOW, d.flow_c),
            ],
            read_adc,
        }
    }

    /// Read every input and return a unified snapshot.
    ///
    /// Individual read failures are logged and the previous good value is
    /// retained; the `*_ok` flags tell the caller whether anything is stale.
    pub fn read_all(&mut self) -> SensorSnapshot {
        let (di, inputs_ok) = match self.inputs.get_dio_states() {
            Ok(di) => (di, true),
            Err(_) => (self.inputs.last(), false),
        };

        let mut temps_ok = true;
        for probe in &mut self.probes {
            if let Err(e) = probe.update((self.read_adc)(probe.channel())) {
                warn!("sensor {}: {}, using {:.1} C", probe.name, e, probe.last());
                temps_ok = false;
            }
        }

        let [outdoor, condenser, storage, flow] = &self.probes;
        SensorSnapshot {
            di,
            temps: Temperatures {
                outdoor_c: outdoor.last(),
                condenser_c: condenser.last(),
                storage_c: storage.last(),
                flow_c: flow.last(),
            },
            inputs_ok,
            temps_ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::DI_COUNT;
    use crate::io::sim::SimPin;

    fn healthy_inputs() -> [SimPin; DI_COUNT] {
        // protective contacts closed (LOW), aux contacts and lock open (HIGH)
        core::array::from_fn(|i| SimPin::new(i >= 3))
    }

    fn midscale(_ch: u32) -> Option<u16> {
        Some(2048)
    }

    fn storage_broken(ch: u32) -> Option<u16> {
        if ch == pins::ADC1_CH_STORAGE { None } else { Some(2048) }
    }

    #[test]
    fn snapshot_combines_inputs_and_temperatures() {
        let mut hub = SensorHub::new(DigitalInputs::new(healthy_inputs()), midscale);
        let snap = hub.read_all();
        assert!(snap.inputs_ok && snap.temps_ok);
        assert_eq!(snap.di.bits(), 0);
        assert!((snap.temps.flow_c - 25.0).abs() < 0.5);
    }

    #[test]
    fn broken_probe_keeps_default_and_flags_stale() {
        let mut hub = SensorHub::new(DigitalInputs::new(healthy_inputs()), storage_broken);
        let snap = hub.read_all();
        assert!(!snap.temps_ok);
        assert_eq!(snap.temps.storage_c, Temperatures::default().storage_c);
    }

    #[test]
    fn broken_input_reuses_last_snapshot() {
        let mut pins = healthy_inputs();
        pins[7] = SimPin::broken();
        let mut hub = SensorHub::new(DigitalInputs::new(pins), midscale);
        let snap = hub.read_all();
        assert!(!snap.inputs_ok);
        assert_eq!(snap.di, Default::default());
    }
}
