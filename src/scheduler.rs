//! Setback (night reduction) schedule.
//!
//! During the setback window the heating curve is lowered by
//! `reduction_c`. The window is a pair of whole hours and may wrap around
//! midnight. Without wall-clock time the controller heats normally.

use crate::config::SystemConfig;

/// Time-of-day window of reduced heating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetbackWindow {
    /// Start hour (0-23 inclusive). E.g. 22 = 10 PM.
    pub start_hour: u8,
    /// End hour (0-23, exclusive). E.g. 6 = 6 AM.
    pub end_hour: u8,
}

impl SetbackWindow {
    pub fn contains(&self, hour: u8) -> bool {
        if self.start_hour <= self.end_hour {
            // e.g., 9..17 (daytime setback)
            hour >= self.start_hour && hour < self.end_hour
        } else {
            // e.g., 22..6 (overnight, wraps around midnight)
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SetbackSchedule {
    window: Option<SetbackWindow>,
}

impl SetbackSchedule {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            window: cfg.setback_start_hour.map(|start_hour| SetbackWindow {
                start_hour,
                end_hour: cfg.setback_end_hour,
            }),
        }
    }

    /// Whether heating is reduced at `hour`. Unknown time is never reduced.
    pub fn is_reduced(&self, hour: Option<u8>) -> bool {
        match (self.window, hour) {
            (Some(w), Some(h)) => w.contains(h),
            _ => false,
        }
    }
}
