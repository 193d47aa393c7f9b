//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to. It contains the latest sensor snapshot, the requested
//! function, compressor command outputs, timing, configuration and the
//! safety fault mask. Think of it as the "blackboard" in a blackboard
//! architecture.

use crate::config::SystemConfig;
use crate::error::SafetyFault;
use crate::fsm::{WpRequest, WpState};
use crate::io::DiStates;
use crate::sensors::temperature::Temperatures;

// ---------------------------------------------------------------------------
// Sensor snapshot (read-only to state handlers; written by sensor hub)
// ---------------------------------------------------------------------------

/// A point-in-time snapshot of every input in the system.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    pub di: DiStates,
    pub temps: Temperatures,
    /// False when the digital inputs could not be read this tick and `di`
    /// is the previous snapshot.
    pub inputs_ok: bool,
    /// False when at least one temperature is a retained value.
    pub temps_ok: bool,
}

// ---------------------------------------------------------------------------
// Compressor commands (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// Outputs owned by the heat-pump state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressorCommands {
    pub crankcase_heater: bool,
    pub k_start: bool,
    pub k_run: bool,
    pub bypass: bool,
    pub fan: bool,
    pub alarm: bool,
}

impl CompressorCommands {
    /// Everything off.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,
    /// Duration of one tick in seconds.
    pub tick_period_secs: f32,

    // -- Inputs --
    pub sensors: SensorSnapshot,
    /// Function requested for this tick.
    pub request: WpRequest,

    // -- Outputs --
    pub commands: CompressorCommands,

    pub config: SystemConfig,

    // -- Safety --
    /// Active safety fault bitmask (see `SafetyFault::mask()`).
    pub fault_flags: u8,

    // -- Compressor bookkeeping --
    /// Tick at which the compressor was last switched on.
    pub compressor_started_tick: Option<u64>,
    /// Tick at which the compressor was last switched off.
    pub compressor_stopped_tick: Option<u64>,
    /// Set when a defrost ran into its time limit; cleared once the
    /// defrost request goes away.
    pub defrost_timed_out: bool,
}

impl FsmContext {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            tick_period_secs: config.tick_secs(),
            sensors: SensorSnapshot::default(),
            request: WpRequest::Idle,
            commands: CompressorCommands::all_off(),
            config,
            fault_flags: 0,
            compressor_started_tick: None,
            compressor_stopped_tick: None,
            defrost_timed_out: false,
        }
    }

    /// Seconds elapsed since the current state was entered.
    pub fn secs_in_state(&self) -> f32 {
        self.ticks_in_state as f32 * self.tick_period_secs
    }

    pub fn has_faults(&self) -> bool {
        self.fault_flags != 0
    }

    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.fault_flags & fault.mask() != 0
    }

    fn secs_since(&self, tick: u64) -> f32 {
        self.total_ticks.saturating_sub(tick) as f32 * self.tick_period_secs
    }

    /// Seconds the compressor has been running, `None` while it is off.
    pub fn secs_since_compressor_start(&self) -> Option<f32> {
        if !(self.commands.k_start || self.commands.k_run) {
            return None;
        }
        self.compressor_started_tick.map(|t| self.secs_since(t))
    }

    /// Remaining restart lockout in seconds, 0 when a start is allowed.
    /// A compressor that never ran is not locked.
    pub fn restart_lock_remaining_secs(&self) -> f32 {
        match self.compressor_stopped_tick {
            Some(t) => (self.config.restart_lockout_secs as f32 - self.secs_since(t)).max(0.0),
            None => 0.0,
        }
    }

    pub fn restart_locked(&self) -> bool {
        self.restart_lock_remaining_secs() > 0.0
    }

    /// The request or the utility asks the compressor to stop.
    pub fn stop_requested(&self) -> bool {
        matches!(self.request, WpRequest::Halt | WpRequest::Idle) || self.sensors.di.tariff_lock
    }

    /// Error state the current fault mask routes to. Machine faults win
    /// over pressure faults.
    pub fn error_target(&self) -> Option<WpState> {
        if self.fault_flags & SafetyFault::MACHINE_MASK != 0 {
            Some(WpState::ErrorM)
        } else if self.fault_flags & SafetyFault::PRESSURE_MASK != 0 {
            Some(WpState::ErrorP)
        } else {
            None
        }
    }

    /// Record a compressor stop if it was running.
    pub fn note_compressor_stop(&mut self) {
        if self.commands.k_start || self.commands.k_run {
            self.compressor_stopped_tick = Some(self.total_ticks);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_controller_is_not_locked() {
        let ctx = FsmContext::new(SystemConfig::default());
        assert!(!ctx.restart_locked());
        assert_eq!(ctx.secs_since_compressor_start(), None);
    }

    #[test]
    fn lockout_counts_down_from_stop() {
        let mut ctx = FsmContext::new(SystemConfig::default());
        ctx.commands.k_run = true;
        ctx.total_ticks = 100;
        ctx.note_compressor_stop();
        ctx.total_ticks = 400;
        assert_eq!(ctx.restart_lock_remaining_secs(), 600.0);
        ctx.total_ticks = 1000;
        assert!(!ctx.restart_locked());
    }

    #[test]
    fn stop_without_running_compressor_is_ignored() {
        let mut ctx = FsmContext::new(SystemConfig::default());
        ctx.note_compressor_stop();
        assert_eq!(ctx.compressor_stopped_tick, None);
    }

    #[test]
    fn error_routing() {
        let mut ctx = FsmContext::new(SystemConfig::default());
        assert_eq!(ctx.error_target(), None);
        ctx.fault_flags = SafetyFault::LowPressure.mask();
        assert_eq!(ctx.error_target(), Some(WpState::ErrorP));
        ctx.fault_flags |= SafetyFault::ContactorFeedback.mask();
        assert_eq!(ctx.error_target(), Some(WpState::ErrorM));
    }
}
