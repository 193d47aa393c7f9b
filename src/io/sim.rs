//! Host-side simulation pins.
//!
//! A [`SimPin`] is a shared logic level: clones observe and drive the same
//! level, so a test keeps one handle while the driver owns the other.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::{Error, ErrorKind, ErrorType, InputPin, OutputPin};

/// Error reported by a pin built with [`SimPin::broken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinError;

impl Error for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Clone)]
pub struct SimPin {
    level: Arc<AtomicBool>,
    broken: bool,
}

impl SimPin {
    pub fn new(high: bool) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(high)),
            broken: false,
        }
    }

    /// A pin whose every access fails.
    pub fn broken() -> Self {
        Self {
            level: Arc::new(AtomicBool::new(false)),
            broken: true,
        }
    }

    pub fn set_level(&self, high: bool) {
        self.level.store(high, Ordering::Relaxed);
    }

    pub fn level(&self) -> bool {
        self.level.load(Ordering::Relaxed)
    }
}

impl ErrorType for SimPin {
    type Error = SimPinError;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.broken {
            return Err(SimPinError);
        }
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.broken {
            return Err(SimPinError);
        }
        self.set_level(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.broken {
            return Err(SimPinError);
        }
        self.set_level(true);
        Ok(())
    }
}
