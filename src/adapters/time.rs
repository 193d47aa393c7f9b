//! Wall-clock adapter for the setback schedule.
//!
//! - **`target_os = "espidf"`**: reads the system clock through
//!   `gettimeofday` / `localtime_r`, but only once it has been set.
//! - **`not(target_os = "espidf")`**: no wall clock; the schedule treats
//!   every hour as normal operation.

use crate::app::ports::ClockPort;

/// Clock backed by the ESP-IDF system time.
#[derive(Debug, Default)]
pub struct EspClock;

impl EspClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for EspClock {
    #[cfg(target_os = "espidf")]
    fn hour_of_day(&self) -> Option<u8> {
        use esp_idf_svc::sys::{gettimeofday, localtime_r, time_t, timeval, tm};

        let mut tv = timeval { tv_sec: 0, tv_usec: 0 };
        // SAFETY: tv is a valid out-pointer; the timezone argument may be null.
        if unsafe { gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        // Anything before 2020-01-01 means the clock was never set.
        const EPOCH_2020: i64 = 1_577_836_800;
        if (tv.tv_sec as i64) < EPOCH_2020 {
            return None;
        }
        let secs = tv.tv_sec as time_t;
        // SAFETY: tm is plain data and fully written by localtime_r.
        let mut out: tm = unsafe { core::mem::zeroed() };
        if unsafe { localtime_r(&secs, &mut out) }.is_null() {
            return None;
        }
        u8::try_from(out.tm_hour).ok().filter(|h| *h < 24)
    }

    #[cfg(not(target_os = "espidf"))]
    fn hour_of_day(&self) -> Option<u8> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_clock_is_unknown() {
        assert_eq!(EspClock::new().hour_of_day(), None);
    }
}
