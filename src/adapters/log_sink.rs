//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production). Telemetry goes out as one
//! JSON line so it can be scraped off the serial console.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => match serde_json::to_string(t) {
                Ok(json) => info!("TELEM | {json}"),
                Err(e) => warn!("TELEM | encode failed: {e}"),
            },
            AppEvent::StateChanged { from, to } => {
                info!("WP | {:?} -> {:?}", from, to);
            }
            AppEvent::ChargeStateChanged { from, to } => {
                info!("LADEN | {:?} -> {:?}", from, to);
            }
            AppEvent::CircuitStateChanged { from, to } => {
                info!("HK | {:?} -> {:?}", from, to);
            }
            AppEvent::FaultDetected(flags) => {
                warn!("FAULT | detected, flags=0b{:04b}", flags);
            }
            AppEvent::FaultCleared => {
                info!("FAULT | all cleared");
            }
            AppEvent::ModeChanged(mode) => {
                info!("MODE | {:?}", mode);
            }
            AppEvent::ActuatorFailure(e) => {
                error!("RELAY | {e}");
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
        }
    }
}
