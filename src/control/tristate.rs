//! Three-point (tristate) controller for the heating-circuit mixing valve.
//!
//! The mixer motor only knows open, close and hold. The controller turns
//! the flow temperature error into a pulse of `min(kp·|e|, 1)` of every
//! switching cycle in the direction of the error. A dead band around zero
//! with hysteresis keeps the motor still once the flow is close enough.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;

/// Drive command for the mixer motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MixerDrive {
    #[default]
    Hold,
    /// Open: more hot water, flow temperature rises.
    Open,
    /// Close: flow temperature falls.
    Close,
}

pub struct TristateController {
    kp: f32,
    e_min: f32,
    hysteresis: f32,
    cycle_secs: f32,
    active: bool,
    /// Position within the current switching cycle (seconds).
    cycle_pos: f32,
}

impl TristateController {
    pub fn new(kp: f32, e_min: f32, hysteresis: f32, cycle_secs: f32) -> Self {
        Self {
            kp,
            e_min,
            hysteresis,
            cycle_secs,
            active: false,
            cycle_pos: 0.0,
        }
    }

    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self::new(cfg.mixer_kp, cfg.mixer_e_min, cfg.mixer_hysteresis, cfg.mixer_cycle_secs)
    }

    /// `true` while the error is outside the dead band.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Compute the drive for setpoint `w` and measured flow `x`.
    pub fn compute(&mut self, w: f32, x: f32, dt: f32) -> MixerDrive {
        let e = w - x;
        let mag = e.abs();

        if mag > self.e_min {
            self.active = true;
        } else if mag < self.e_min - self.hysteresis {
            self.active = false;
        }
        if !self.active {
            self.cycle_pos = 0.0;
            return MixerDrive::Hold;
        }

        let on_time = (self.kp * mag).min(1.0) * self.cycle_secs;
        let drive = if self.cycle_pos < on_time {
            if e > 0.0 { MixerDrive::Open } else { MixerDrive::Close }
        } else {
            MixerDrive::Hold
        };

        self.cycle_pos += dt;
        if self.cycle_pos >= self.cycle_secs {
            self.cycle_pos = 0.0;
        }
        drive
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.active = false;
        self.cycle_pos = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctl() -> TristateController {
        TristateController::from_config(&SystemConfig::default())
    }

    fn cycle(c: &mut TristateController, w: f32, x: f32) -> [MixerDrive; 10] {
        core::array::from_fn(|_| c.compute(w, x, 1.0))
    }

    #[test]
    fn dead_band_holds() {
        let mut c = ctl();
        assert_eq!(c.compute(40.0, 39.8, 1.0), MixerDrive::Hold);
        assert!(!c.is_active());
    }

    #[test]
    fn pulse_length_is_proportional() {
        let mut c = ctl();
        // e = 1 K, kp 0.35 -> 3.5 s of a 10 s cycle
        let drives = cycle(&mut c, 41.0, 40.0);
        let opens = drives.iter().filter(|d| **d == MixerDrive::Open).count();
        assert_eq!(opens, 4);
        assert!(drives[4..].iter().all(|d| *d == MixerDrive::Hold));
    }

    #[test]
    fn large_error_saturates_to_full_cycle() {
        let mut c = ctl();
        let drives = cycle(&mut c, 30.0, 40.0);
        assert!(drives.iter().all(|d| *d == MixerDrive::Close));
    }

    #[test]
    fn hysteresis_keeps_regulating_until_inner_band() {
        let mut c = ctl();
        c.compute(45.0, 40.0, 1.0);
        assert!(c.is_active());
        // |e| = 0.3: inside e_min, outside e_min - hysteresis
        c.compute(40.3, 40.0, 1.0);
        assert!(c.is_active());
        // |e| = 0.1: below 0.2
        assert_eq!(c.compute(40.1, 40.0, 1.0), MixerDrive::Hold);
        assert!(!c.is_active());
    }
}
