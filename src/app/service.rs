//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the heat-pump FSM, the safety supervisor, storage
//! charging and the heating circuit. It exposes a hardware-agnostic API.
//! All I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!   ClockPort ──▶ │          AppService           │
//! ActuatorPort ◀──│ Charging · Safety · FSM · HC  │
//!                 └──────────────────────────────┘
//! ```

use log::{info, warn};

use crate::charging::{ChargeInputs, StorageCharging};
use crate::config::SystemConfig;
use crate::control::{CircuitInputs, CircuitOutputs, HeatingCircuit, calc_flow_setpoint};
use crate::error::{Error, SafetyFault};
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, WpRequest, WpState};
use crate::io::Outputs;
use crate::safety::{FaultRecord, SafetySupervisor};
use crate::scheduler::SetbackSchedule;
use crate::status::{OperatingMode, SystemStatus};

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, ClockPort, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    safety: SafetySupervisor,
    charging: StorageCharging,
    circuit: HeatingCircuit,
    setback: SetbackSchedule,
    mode: OperatingMode,
    manual_request: WpRequest,
    reduced: bool,
    flow_setpoint_c: f32,
    outputs: Outputs,
    status: SystemStatus,
    /// Seconds per control tick (derived from config).
    tick_secs: f32,
    tick_count: u64,
    last_telemetry_tick: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let tick_secs = config.tick_secs();
        let safety = SafetySupervisor::new(&config);
        let circuit = HeatingCircuit::new(&config);
        let setback = SetbackSchedule::from_config(&config);
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), WpState::Idle);

        Self {
            fsm,
            ctx,
            safety,
            charging: StorageCharging::new(),
            circuit,
            setback,
            mode: OperatingMode::Auto,
            manual_request: WpRequest::Idle,
            reduced: false,
            flow_setpoint_c: 0.0,
            outputs: Outputs::all_off(),
            status: SystemStatus::default(),
            tick_secs,
            tick_count: 0,
            last_telemetry_tick: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in IDLE.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {:?}, mode {:?}", self.fsm.current_state(), self.mode);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// Sensors → setback → flow setpoint → charging → request by mode →
    /// safety + heat-pump FSM → heating circuit → outputs → status → events.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`]; this avoids a double mutable borrow while keeping
    /// the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let prev_hp = self.fsm.current_state();
        let prev_charge = self.charging.state();
        let prev_circuit = self.circuit.state();
        let prev_faults = self.ctx.fault_flags;

        // 1. Inputs
        let snap = hw.read_all();
        if !snap.inputs_ok {
            warn!("digital inputs stale this tick");
        }
        self.ctx.sensors = snap;

        // 2. Setback and heating curve
        self.reduced = self.setback.is_reduced(clock.hour_of_day());
        self.flow_setpoint_c =
            calc_flow_setpoint(snap.temps.outdoor_c, self.reduced, &self.ctx.config);

        // 3. Storage charging, against the heat-pump state of the last tick
        let charge = self.charging.update(
            self.flow_setpoint_c,
            &ChargeInputs {
                storage_c: snap.temps.storage_c,
                outdoor_c: snap.temps.outdoor_c,
                tariff_lock: snap.di.tariff_lock,
                hp_state: prev_hp,
                restart_locked: self.ctx.restart_locked(),
                enabled: self.mode == OperatingMode::Auto,
            },
            &self.ctx.config,
            self.tick_secs,
        );

        // 4. Who decides what the heat pump does
        let request = match self.mode {
            OperatingMode::Auto => charge.request,
            OperatingMode::Manual => self.manual_request,
            OperatingMode::Off => WpRequest::Halt,
        };

        // 5. Safety + heat-pump FSM
        let hp = self.wp_statemachine(request);

        // 6. Heating circuit
        let circuit = self.circuit.update(
            &CircuitInputs {
                mode: self.mode,
                charge_state: self.charging.state(),
                hp_state: hp,
                flow_setpoint_c: self.flow_setpoint_c,
                flow_c: snap.temps.flow_c,
            },
            &self.ctx.config,
            self.tick_secs,
        );

        // 7. Apply outputs
        self.outputs = self.compose_outputs(charge.charge_pump, &circuit);
        if let Err(e) = hw.apply(&self.outputs) {
            warn!("output apply failed: {e}, switching all off");
            hw.all_off();
            self.outputs = Outputs::all_off();
            sink.emit(&AppEvent::ActuatorFailure(e));
        }

        // 8. Status word
        self.status = SystemStatus::compose(
            &self.outputs,
            &snap.di,
            hp,
            self.mode,
            self.reduced,
            circuit.flow_controller_active,
        );

        // 9. Events
        let faults = self.ctx.fault_flags;
        if faults & !prev_faults != 0 {
            sink.emit(&AppEvent::FaultDetected(faults));
        } else if faults == 0 && prev_faults != 0 {
            sink.emit(&AppEvent::FaultCleared);
        }
        if hp != prev_hp {
            sink.emit(&AppEvent::StateChanged { from: prev_hp, to: hp });
        }
        let charge_state = self.charging.state();
        if charge_state != prev_charge {
            sink.emit(&AppEvent::ChargeStateChanged { from: prev_charge, to: charge_state });
        }
        let circuit_state = self.circuit.state();
        if circuit_state != prev_circuit {
            sink.emit(&AppEvent::CircuitStateChanged { from: prev_circuit, to: circuit_state });
        }
        if self.telemetry_due() {
            self.last_telemetry_tick = self.tick_count;
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    /// Advance the heat pump by one tick for the given request and return
    /// its new state.
    ///
    /// The safety supervisor evaluates first against the commands applied
    /// in the previous tick; any fault forces the matching error state
    /// before the state's own update runs.
    pub fn wp_statemachine(&mut self, request: WpRequest) -> WpState {
        self.ctx.request = request;

        let run_secs = self.ctx.secs_since_compressor_start();
        let defrosting = self.fsm.current_state() == WpState::Defrost;
        let faults = self.safety.evaluate(
            &self.ctx.sensors.di,
            &self.ctx.commands,
            run_secs,
            defrosting,
            self.tick_secs,
        );
        self.ctx.fault_flags = faults;

        if let Some(target) = self.ctx.error_target() {
            if !self.fsm.current_state().is_error() {
                warn!("Safety fault! flags=0b{:04b}", faults);
                self.fsm.force_transition(target, &mut self.ctx);
            }
        }

        self.fsm.tick(&mut self.ctx);
        self.fsm.current_state()
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) -> Result<(), Error> {
        match cmd {
            AppCommand::SetMode(mode) => {
                if mode != self.mode {
                    info!("operating mode {:?} -> {:?}", self.mode, mode);
                    self.mode = mode;
                    self.manual_request = WpRequest::Idle;
                    sink.emit(&AppEvent::ModeChanged(mode));
                }
            }
            AppCommand::ManualRequest(req) => {
                if self.mode != OperatingMode::Manual {
                    return Err(Error::Rejected("manual request outside manual mode"));
                }
                info!("manual request {:?}", req);
                self.manual_request = req;
            }
            AppCommand::SetCircuitOutputs(out) => {
                if self.mode != OperatingMode::Manual {
                    return Err(Error::Rejected("circuit outputs outside manual mode"));
                }
                self.circuit.set_manual(out);
            }
            AppCommand::UpdateConfig(new_config) => {
                new_config.validate()?;
                self.tick_secs = new_config.tick_secs();
                self.ctx.tick_period_secs = self.tick_secs;
                self.safety.reconfigure(&new_config);
                self.circuit.reconfigure(&new_config);
                self.setback = SetbackSchedule::from_config(&new_config);
                self.ctx.config = new_config;
                info!("Configuration updated at runtime");
            }
            AppCommand::AcknowledgeFaults => {
                for rec in self.safety.history() {
                    info!(
                        "fault log: tick {} {} {}",
                        rec.tick,
                        rec.fault,
                        if rec.active { "set" } else { "cleared" }
                    );
                }
                for fault in SafetyFault::ALL {
                    if self.safety.has_fault(fault) {
                        warn!("acknowledged while active: {fault}");
                    }
                }
                self.safety.acknowledge();
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current context.
    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            hp_state: self.fsm.current_state(),
            charge_state: self.charging.state(),
            circuit_state: self.circuit.state(),
            mode: self.mode,
            temps: self.ctx.sensors.temps,
            flow_setpoint_c: self.flow_setpoint_c,
            storage_setpoint_c: self.charging.setpoint_c(),
            status_bits: self.status.bits(),
            di_bits: self.ctx.sensors.di.bits(),
            fault_flags: self.ctx.fault_flags,
            restart_lock_secs: self.ctx.restart_lock_remaining_secs() as u32,
        }
    }

    /// Current heat-pump state.
    pub fn state(&self) -> WpState {
        self.fsm.current_state()
    }

    pub fn charge_state(&self) -> crate::charging::ChargeState {
        self.charging.state()
    }

    pub fn circuit_state(&self) -> crate::control::ReglerState {
        self.circuit.state()
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Output word applied in the last tick.
    pub fn outputs(&self) -> Outputs {
        self.outputs
    }

    /// Status composed in the last tick.
    pub fn status(&self) -> SystemStatus {
        self.status
    }

    pub fn flow_setpoint_c(&self) -> f32 {
        self.flow_setpoint_c
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Current active fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.ctx.fault_flags
    }

    pub fn fault_history(&self) -> impl Iterator<Item = &FaultRecord> {
        self.safety.history()
    }

    /// Clone of the live configuration.
    pub fn current_config(&self) -> SystemConfig {
        self.ctx.config.clone()
    }

    // ── Internal ──────────────────────────────────────────────

    /// Merge FSM, charging and circuit outputs into one relay word.
    ///
    /// Compressor contactors are double-gated: the FSM drops them on a
    /// fault, and this function never passes them through while any
    /// fault bit is set.
    fn compose_outputs(&self, charge_pump: bool, circuit: &CircuitOutputs) -> Outputs {
        let c = &self.ctx.commands;
        let healthy = !self.ctx.has_faults();
        let charge_pump = match self.mode {
            OperatingMode::Manual => charge_pump || c.k_start || c.k_run,
            OperatingMode::Auto | OperatingMode::Off => charge_pump,
        };
        Outputs {
            crankcase_heater: c.crankcase_heater,
            k_start: c.k_start && healthy,
            k_run: c.k_run && healthy,
            bypass: c.bypass && healthy,
            fan: c.fan,
            charge_pump,
            heating_pump: circuit.heating_pump,
            mixer_open: circuit.mixer_open,
            mixer_close: circuit.mixer_close,
            alarm: c.alarm,
            reserve1: false,
            reserve2: false,
        }
    }

    fn telemetry_due(&self) -> bool {
        let interval = self.ctx.config.telemetry_interval_secs;
        if interval == 0 {
            return false;
        }
        let every = ((interval as f32 / self.tick_secs) as u64).max(1);
        self.tick_count - self.last_telemetry_tick >= every
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::ClockPort;
    use crate::error::ActuatorError;
    use crate::fsm::context::SensorSnapshot;
    use crate::sensors::temperature::Temperatures;

    #[derive(Default)]
    struct Hw {
        snap: SensorSnapshot,
        applied: Option<Outputs>,
    }

    impl SensorPort for Hw {
        fn read_all(&mut self) -> SensorSnapshot {
            self.snap
        }
    }

    impl ActuatorPort for Hw {
        fn apply(&mut self, outputs: &Outputs) -> Result<(), ActuatorError> {
            self.applied = Some(*outputs);
            Ok(())
        }
        fn all_off(&mut self) {
            self.applied = Some(Outputs::all_off());
        }
    }

    #[derive(Default)]
    struct Sink(Vec<String>);

    impl EventSink for Sink {
        fn emit(&mut self, event: &AppEvent) {
            self.0.push(format!("{event:?}"));
        }
    }

    const NOON: Option<u8> = Some(12);

    #[test]
    fn warm_storage_keeps_heat_pump_idle() {
        let mut app = AppService::new(SystemConfig::default());
        let mut sink = Sink::default();
        app.start(&mut sink);
        let mut hw = Hw {
            snap: SensorSnapshot {
                temps: Temperatures { storage_c: 60.0, ..Temperatures::default() },
                inputs_ok: true,
                temps_ok: true,
                ..SensorSnapshot::default()
            },
            ..Hw::default()
        };
        app.tick(&mut hw, &NOON, &mut sink);
        assert_eq!(app.state(), WpState::Idle);
        let out = hw.applied.unwrap();
        assert!(out.crankcase_heater && !out.compressor_on());
    }

    #[test]
    fn manual_commands_need_manual_mode() {
        let mut app = AppService::new(SystemConfig::default());
        let mut sink = Sink::default();
        assert_eq!(
            app.handle_command(AppCommand::ManualRequest(WpRequest::Laden), &mut sink),
            Err(Error::Rejected("manual request outside manual mode"))
        );
        app.handle_command(AppCommand::SetMode(OperatingMode::Manual), &mut sink).unwrap();
        app.handle_command(AppCommand::ManualRequest(WpRequest::Laden), &mut sink).unwrap();
        assert!(sink.0.iter().any(|e| e.contains("ModeChanged(Manual)")));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut app = AppService::new(SystemConfig::default());
        let bad = SystemConfig { curve_level: 0, ..SystemConfig::default() };
        let res = app.handle_command(AppCommand::UpdateConfig(bad), &mut Sink::default());
        assert!(matches!(res, Err(Error::Config(_))));
        assert_eq!(app.current_config().curve_level, SystemConfig::default().curve_level);
    }

    #[test]
    fn setback_lowers_flow_setpoint() {
        let mut app = AppService::new(SystemConfig::default());
        let mut sink = Sink::default();
        app.start(&mut sink);
        let mut hw = Hw::default();
        hw.snap.temps.outdoor_c = -5.0;
        app.tick(&mut hw, &NOON, &mut sink);
        let day = app.flow_setpoint_c();
        app.tick(&mut hw, &Some(23u8), &mut sink);
        let night = app.flow_setpoint_c();
        assert!((day - night - app.current_config().reduction_c).abs() < 0.01);
        assert!(app.status().reduced);
        assert_eq!(Some(23u8).hour_of_day(), Some(23));
    }

    #[test]
    fn telemetry_follows_interval() {
        let cfg = SystemConfig { telemetry_interval_secs: 5, ..SystemConfig::default() };
        let mut app = AppService::new(cfg);
        let mut sink = Sink::default();
        app.start(&mut sink);
        let mut hw = Hw::default();
        for _ in 0..10 {
            app.tick(&mut hw, &NOON, &mut sink);
        }
        let n = sink.0.iter().filter(|e| e.starts_with("Telemetry")).count();
        assert_eq!(n, 2);
    }
}
