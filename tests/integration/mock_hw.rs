//! Mock plant for integration tests.
//!
//! Behaves like the controller board wired to a heat pump: every applied
//! relay word is recorded, and the contactor auxiliary contacts follow the
//! contactor relays on the next sample unless a test disconnects them.

use wpcontrol::app::events::AppEvent;
use wpcontrol::app::ports::{ActuatorPort, EventSink, SensorPort};
use wpcontrol::error::ActuatorError;
use wpcontrol::fsm::context::SensorSnapshot;
use wpcontrol::io::{DiStates, Outputs};
use wpcontrol::sensors::temperature::Temperatures;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    Apply(Outputs),
    AllOff,
}

// ── MockPlant ─────────────────────────────────────────────────

pub struct MockPlant {
    pub di: DiStates,
    pub temps: Temperatures,
    pub calls: Vec<ActuatorCall>,
    /// Auxiliary contacts echo the contactor relays.
    pub feedback_wired: bool,
    /// Next `apply` fails with this error.
    pub fail_apply: Option<ActuatorError>,
    relays: Outputs,
}

impl MockPlant {
    /// Cold storage at a mild outdoor temperature: a charge is due.
    pub fn new() -> Self {
        Self {
            di: DiStates::default(),
            temps: Temperatures {
                outdoor_c: 5.0,
                condenser_c: 30.0,
                storage_c: 25.0,
                flow_c: 30.0,
            },
            calls: Vec::new(),
            feedback_wired: true,
            fail_apply: None,
            relays: Outputs::all_off(),
        }
    }

    /// Relay word currently on the board.
    pub fn relays(&self) -> Outputs {
        self.relays
    }
}

impl Default for MockPlant {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockPlant {
    fn read_all(&mut self) -> SensorSnapshot {
        if self.feedback_wired {
            self.di.k_start = self.relays.k_start;
            self.di.k_run = self.relays.k_run;
        }
        SensorSnapshot {
            di: self.di,
            temps: self.temps,
            inputs_ok: true,
            temps_ok: true,
        }
    }
}

impl ActuatorPort for MockPlant {
    fn apply(&mut self, outputs: &Outputs) -> Result<(), ActuatorError> {
        if let Some(e) = self.fail_apply.take() {
            return Err(e);
        }
        self.relays = *outputs;
        self.calls.push(ActuatorCall::Apply(*outputs));
        Ok(())
    }

    fn all_off(&mut self) {
        self.relays = Outputs::all_off();
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Event sink that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
