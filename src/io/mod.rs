//! Control I/O: digital inputs, relay outputs and one-time setup.
//!
//! Everything here is generic over `embedded-hal` pin traits, so the same
//! code drives the raw-GPIO `GpioIn`/`GpioOut` pins from [`hw_init`] on
//! target and [`sim::SimPin`]s on the host.

pub mod digital_inputs;
pub mod hw_init;
pub mod outputs;
#[cfg(not(target_os = "espidf"))]
pub mod sim;

use embedded_hal::digital::{InputPin, OutputPin};
use log::info;

pub use digital_inputs::{DiStates, DigitalInputs};
pub use hw_init::HwInitError;
pub use outputs::{Outputs, RelayOutputs};

/// Number of digital inputs on the controller board.
pub const DI_COUNT: usize = 8;
/// Number of relay outputs on the controller board.
pub const DO_COUNT: usize = 12;

/// Control I/O after setup: input reader plus relay bank.
pub struct ControlIo<I, O> {
    pub inputs: DigitalInputs<I>,
    pub outputs: RelayOutputs<O>,
}

/// One-time control I/O initialisation.
///
/// Every relay is de-energised before the first input sample is taken, so
/// a controller that resets mid-run never leaves a contactor pulled in.
/// The returned bundle already holds a valid input snapshot.
pub fn setup_steuer_io<I, O>(
    input_pins: [I; DI_COUNT],
    output_pins: [O; DO_COUNT],
) -> Result<ControlIo<I, O>, HwInitError>
where
    I: InputPin,
    O: OutputPin,
{
    let mut outputs = RelayOutputs::new(output_pins);
    outputs
        .all_off()
        .map_err(|_| HwInitError::OutputInitFailed)?;

    let mut inputs = DigitalInputs::new(input_pins);
    let initial = inputs
        .get_dio_states()
        .map_err(|_| HwInitError::InputInitFailed)?;

    info!("setup_steuer_io: outputs off, inputs=0b{:08b}", initial.bits());
    Ok(ControlIo { inputs, outputs })
}

#[cfg(test)]
mod tests {
    use super::sim::SimPin;
    use super::*;

    fn pins<const N: usize>(level: bool) -> [SimPin; N] {
        core::array::from_fn(|_| SimPin::new(level))
    }

    #[test]
    fn setup_switches_every_output_off() {
        let outs: [SimPin; DO_COUNT] = pins(true);
        let handles = outs.clone();
        let io = setup_steuer_io(pins::<DI_COUNT>(false), outs).unwrap();
        assert!(handles.iter().all(|p| !p.level()));
        assert_eq!(io.outputs.current(), Outputs::all_off());
    }

    #[test]
    fn setup_samples_inputs() {
        // All input pins low: protective contacts closed (healthy),
        // auxiliary contacts and tariff lock active.
        let io = setup_steuer_io(pins::<DI_COUNT>(false), pins::<DO_COUNT>(false)).unwrap();
        let di = io.inputs.last();
        assert!(!di.low_pressure && !di.high_pressure && !di.motor_protection);
        assert!(di.k_start && di.k_run && di.tariff_lock);
    }

    #[test]
    fn setup_fails_when_an_input_is_unreadable() {
        let mut inputs = pins::<DI_COUNT>(false);
        inputs[2] = SimPin::broken();
        let res = setup_steuer_io(inputs, pins::<DO_COUNT>(false));
        assert!(matches!(res, Err(HwInitError::InputInitFailed)));
    }
}
