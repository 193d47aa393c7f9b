//! Safety supervisor.
//!
//! The supervisor runs **every tick before the heat-pump FSM** and
//! maintains a fault bitmask in `FsmContext.fault_flags`. The FSM state
//! handlers route the mask to `ERROR_P` or `ERROR_M`.
//!
//! ## Fault lifecycle
//!
//! 1. A condition triggers a fault (e.g. high-pressure switch open).
//! 2. The supervisor sets the corresponding bit.
//! 3. The FSM enters the matching error state; compressor outputs drop.
//! 4. Each tick the supervisor re-evaluates. If the condition clears, it
//!    unsets the bit. A set low-pressure bit is cleared only by the switch
//!    itself, not by the check being disarmed when the contactors drop.
//!    A contactor fault holds until the feedback matches the command that
//!    was applied when it tripped, or until the operator acknowledges it.
//! 5. When the mask is empty the error state returns to `IDLE`, where the
//!    restart lockout applies.
//!
//! Multiple faults may be active at once. Every set/clear edge is kept in
//! a bounded history for diagnostics.

use heapless::Deque;
use log::{error, info};
use serde::Serialize;

use crate::config::SystemConfig;
use crate::error::SafetyFault;
use crate::fsm::context::CompressorCommands;
use crate::io::DiStates;

/// Capacity of the fault history ring.
pub const FAULT_HISTORY_LEN: usize = 16;

/// One fault edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaultRecord {
    /// Supervisor tick at which the edge was seen.
    pub tick: u64,
    pub fault: SafetyFault,
    /// `true` for set, `false` for cleared.
    pub active: bool,
}

/// Safety supervisor.
pub struct SafetySupervisor {
    low_pressure_bypass_secs: f32,
    contactor_grace_secs: f32,
    faults: u8,
    ticks: u64,
    /// Seconds the start contactor feedback has disagreed with its command.
    k_start_mismatch_secs: f32,
    k_run_mismatch_secs: f32,
    /// Feedback (k_start, k_run) expected while a contactor fault is held.
    feedback_latch: Option<(bool, bool)>,
    history: Deque<FaultRecord, FAULT_HISTORY_LEN>,
}

impl SafetySupervisor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            low_pressure_bypass_secs: f32::from(config.low_pressure_bypass_secs),
            contactor_grace_secs: f32::from(config.contactor_grace_secs),
            faults: 0,
            ticks: 0,
            k_start_mismatch_secs: 0.0,
            k_run_mismatch_secs: 0.0,
            feedback_latch: None,
            history: Deque::new(),
        }
    }

    /// Pick up new thresholds after a configuration change.
    pub fn reconfigure(&mut self, config: &SystemConfig) {
        self.low_pressure_bypass_secs = f32::from(config.low_pressure_bypass_secs);
        self.contactor_grace_secs = f32::from(config.contactor_grace_secs);
    }

    /// Evaluate all safety conditions. Returns the updated fault bitmask.
    ///
    /// * `cmds` are the contactor commands currently applied.
    /// * `run_secs` is the compressor run time, `None` while it is off.
    /// * `defrosting` suppresses the low-pressure check.
    pub fn evaluate(
        &mut self,
        di: &DiStates,
        cmds: &CompressorCommands,
        run_secs: Option<f32>,
        defrosting: bool,
        dt_secs: f32,
    ) -> u8 {
        self.ticks += 1;

        self.eval_fault(SafetyFault::HighPressure, di.high_pressure);
        self.eval_fault(SafetyFault::MotorProtection, di.motor_protection);

        // ── Low pressure (only once the circuit has settled) ──────
        let lp_armed = cmds.k_run
            && !defrosting
            && run_secs.is_some_and(|s| s > self.low_pressure_bypass_secs);
        let lp_tripped = if lp_armed || self.has_fault(SafetyFault::LowPressure) {
            di.low_pressure
        } else {
            false
        };
        self.eval_fault(SafetyFault::LowPressure, lp_tripped);

        // ── Contactor feedback ────────────────────────────────────
        self.k_start_mismatch_secs =
            Self::track_mismatch(self.k_start_mismatch_secs, cmds.k_start != di.k_start, dt_secs);
        self.k_run_mismatch_secs =
            Self::track_mismatch(self.k_run_mismatch_secs, cmds.k_run != di.k_run, dt_secs);
        let mismatch = self.k_start_mismatch_secs > self.contactor_grace_secs
            || self.k_run_mismatch_secs > self.contactor_grace_secs;
        if mismatch && self.feedback_latch.is_none() {
            self.feedback_latch = Some((cmds.k_start, cmds.k_run));
        }
        let feedback_bad = match self.feedback_latch {
            Some(expected) => mismatch || (di.k_start, di.k_run) != expected,
            None => false,
        };
        if !feedback_bad {
            self.feedback_latch = None;
        }
        self.eval_fault(SafetyFault::ContactorFeedback, feedback_bad);

        self.faults
    }

    pub fn faults(&self) -> u8 {
        self.faults
    }

    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.faults & fault.mask() != 0
    }

    /// Fault edges, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &FaultRecord> {
        self.history.iter()
    }

    /// Drop the fault history. Active faults are unaffected.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Operator reset: release a held contactor fault and drop the
    /// history. The bit clears on the next evaluation if the feedback
    /// then agrees with the commands.
    pub fn acknowledge(&mut self) {
        self.feedback_latch = None;
        self.k_start_mismatch_secs = 0.0;
        self.k_run_mismatch_secs = 0.0;
        self.clear_history();
    }

    // ── Internal ──────────────────────────────────────────────────

    fn track_mismatch(secs: f32, mismatch: bool, dt_secs: f32) -> f32 {
        if mismatch { secs + dt_secs } else { 0.0 }
    }

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: SafetyFault, condition: bool) {
        let was = self.faults & fault.mask() != 0;
        if condition == was {
            return;
        }
        if condition {
            error!("SAFETY FAULT SET: {fault}");
            self.faults |= fault.mask();
        } else {
            info!("SAFETY FAULT CLEARED: {fault}");
            self.faults &= !fault.mask();
        }
        self.record(fault, condition);
    }

    fn record(&mut self, fault: SafetyFault, active: bool) {
        if self.history.is_full() {
            self.history.pop_front();
        }
        let _ = self.history.push_back(FaultRecord {
            tick: self.ticks,
            fault,
            active,
        });
    }
}
