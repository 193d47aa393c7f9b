//! Heating curve: outdoor temperature to flow setpoint.
//!
//! Each level is a straight line stored in fixed point (×100). Level 1 is
//! the flattest curve for well-insulated buildings, level 8 the steepest.
//! All curves meet at roughly 20 °C flow for 20 °C outdoor.

use crate::config::SystemConfig;

/// Number of selectable curve levels.
pub const CURVE_LEVELS: usize = 8;

/// One heating curve: `flow = (slope_x100 * outdoor + offset_x100) / 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatingCurve {
    pub slope_x100: i16,
    pub offset_x100: i16,
}

/// Curve table, index 0 = level 1.
pub const HEATING_CURVES: [HeatingCurve; CURVE_LEVELS] = [
    HeatingCurve { slope_x100: -27, offset_x100: 2533 },
    HeatingCurve { slope_x100: -40, offset_x100: 2800 },
    HeatingCurve { slope_x100: -53, offset_x100: 3067 },
    HeatingCurve { slope_x100: -67, offset_x100: 3333 },
    HeatingCurve { slope_x100: -80, offset_x100: 3600 },
    HeatingCurve { slope_x100: -93, offset_x100: 3867 },
    HeatingCurve { slope_x100: -107, offset_x100: 4133 },
    HeatingCurve { slope_x100: -120, offset_x100: 4400 },
];

impl HeatingCurve {
    /// Curve for a 1-based level; out-of-range levels are clamped.
    pub fn for_level(level: u8) -> Self {
        let idx = usize::from(level.max(1) - 1).min(CURVE_LEVELS - 1);
        HEATING_CURVES[idx]
    }

    /// Unclamped flow temperature for an outdoor temperature.
    pub fn flow_for(&self, outdoor_c: f32) -> f32 {
        (f32::from(self.slope_x100) * outdoor_c + f32::from(self.offset_x100)) / 100.0
    }
}

/// Flow setpoint for the heating circuit.
///
/// Applies the configured curve level and parallel shift, subtracts the
/// setback reduction while `reduced`, and clamps to the flow limits.
pub fn calc_flow_setpoint(outdoor_c: f32, reduced: bool, cfg: &SystemConfig) -> f32 {
    let curve = HeatingCurve::for_level(cfg.curve_level);
    let mut flow = curve.flow_for(outdoor_c) + f32::from(cfg.parallel_shift_c);
    if reduced {
        flow -= cfg.reduction_c;
    }
    flow.clamp(cfg.flow_min_c, cfg.flow_max_c)
}
