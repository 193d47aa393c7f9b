//! Integration tests for the AppService → charging → heat-pump FSM →
//! relay pipeline, driven against the mock plant.

use wpcontrol::app::commands::AppCommand;
use wpcontrol::app::events::AppEvent;
use wpcontrol::app::service::AppService;
use wpcontrol::charging::ChargeState;
use wpcontrol::config::SystemConfig;
use wpcontrol::error::{ActuatorError, Error};
use wpcontrol::fsm::{WpRequest, WpState};
use wpcontrol::status::OperatingMode;

use crate::mock_hw::{ActuatorCall, MockPlant, RecordingSink};

const NOON: Option<u8> = Some(12);

fn make_app() -> (AppService, MockPlant, RecordingSink) {
    let mut app = AppService::new(SystemConfig::default());
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    (app, MockPlant::new(), sink)
}

fn run(app: &mut AppService, hw: &mut MockPlant, sink: &mut RecordingSink, ticks: u32) {
    for _ in 0..ticks {
        app.tick(hw, &NOON, sink);
    }
}

/// Tick until the heat pump reaches `state`, at most `limit` ticks.
fn run_until(
    app: &mut AppService,
    hw: &mut MockPlant,
    sink: &mut RecordingSink,
    state: WpState,
    limit: u32,
) -> bool {
    for _ in 0..limit {
        app.tick(hw, &NOON, sink);
        if app.state() == state {
            return true;
        }
    }
    false
}

// ── Charge cycle ─────────────────────────────────────────────

#[test]
fn cold_storage_starts_compressor_through_start_contactor() {
    let (mut app, mut hw, mut sink) = make_app();

    app.tick(&mut hw, &NOON, &mut sink);
    assert_eq!(app.charge_state(), ChargeState::Laden);
    assert_eq!(app.state(), WpState::Start);
    let out = hw.relays();
    assert!(out.k_start && !out.k_run, "start contactor first");
    assert!(out.charge_pump);

    assert!(run_until(&mut app, &mut hw, &mut sink, WpState::Run, 5));
    let out = hw.relays();
    assert!(out.k_run && !out.k_start && out.fan);
    assert!(app.status().compressor);
    assert_eq!(app.fault_flags(), 0);
}

#[test]
fn warm_storage_ends_charge_and_locks_restart() {
    let (mut app, mut hw, mut sink) = make_app();
    assert!(run_until(&mut app, &mut hw, &mut sink, WpState::Run, 5));

    hw.temps.storage_c = 60.0;
    app.tick(&mut hw, &NOON, &mut sink);
    assert_eq!(app.charge_state(), ChargeState::Stop);
    assert_eq!(app.state(), WpState::Stop);
    let out = hw.relays();
    assert!(!out.compressor_on());
    assert!(out.fan, "fan runs on after stop");
    assert!(out.charge_pump, "charge pump runs on after stop");

    let overrun = u32::from(app.current_config().fan_overrun_secs);
    run(&mut app, &mut hw, &mut sink, overrun + 2);
    assert_eq!(app.state(), WpState::Idle);
    assert!(!hw.relays().fan);
    assert!(app.build_telemetry().restart_lock_secs > 0);

    // Storage cools down again, but the lockout holds the compressor off.
    hw.temps.storage_c = 25.0;
    run(&mut app, &mut hw, &mut sink, 200);
    assert_eq!(app.state(), WpState::Idle);
    assert!(!hw.relays().compressor_on());
}

#[test]
fn tariff_lock_blocks_charging() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.di.tariff_lock = true;
    run(&mut app, &mut hw, &mut sink, 10);
    assert_eq!(app.state(), WpState::Idle);
    assert_eq!(app.charge_state(), ChargeState::Idle);
    assert!(app.status().tariff_lock);
    assert!(!hw.relays().compressor_on());
}

// ── Safety ───────────────────────────────────────────────────

#[test]
fn high_pressure_trips_to_error_p_and_recovers_to_idle() {
    let (mut app, mut hw, mut sink) = make_app();
    assert!(run_until(&mut app, &mut hw, &mut sink, WpState::Run, 5));

    hw.di.high_pressure = true;
    app.tick(&mut hw, &NOON, &mut sink);
    assert_eq!(app.state(), WpState::ErrorP);
    let out = hw.relays();
    assert!(!out.compressor_on());
    assert!(out.alarm);
    assert!(app.status().pressure_high);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FaultDetected(_))), 1);

    hw.di.high_pressure = false;
    app.tick(&mut hw, &NOON, &mut sink);
    assert_eq!(app.state(), WpState::Idle);
    assert!(!hw.relays().alarm);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FaultCleared)), 1);
    assert!(app.fault_history().count() >= 2);
}

#[test]
fn motor_protection_wins_over_pressure() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.di.high_pressure = true;
    hw.di.motor_protection = true;
    app.tick(&mut hw, &NOON, &mut sink);
    assert_eq!(app.state(), WpState::ErrorM);
}

#[test]
fn missing_contactor_feedback_raises_machine_fault() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.feedback_wired = false;
    assert!(run_until(&mut app, &mut hw, &mut sink, WpState::ErrorM, 8));
    assert!(!hw.relays().compressor_on());
    assert!(hw.relays().alarm);
}

#[test]
fn low_pressure_is_bypassed_during_start_up() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.di.low_pressure = true;
    let bypass = u32::from(app.current_config().low_pressure_bypass_secs);
    run(&mut app, &mut hw, &mut sink, bypass - 5);
    assert_eq!(app.state(), WpState::Run);
    assert!(run_until(&mut app, &mut hw, &mut sink, WpState::ErrorP, 20));
}

#[test]
fn low_pressure_trip_holds_error_p_while_switch_stays_tripped() {
    let (mut app, mut hw, mut sink) = make_app();
    assert!(run_until(&mut app, &mut hw, &mut sink, WpState::Run, 5));
    let bypass = u32::from(app.current_config().low_pressure_bypass_secs);
    run(&mut app, &mut hw, &mut sink, bypass + 10);
    assert_eq!(app.state(), WpState::Run);

    hw.di.low_pressure = true;
    app.tick(&mut hw, &NOON, &mut sink);
    assert_eq!(app.state(), WpState::ErrorP);

    // Well past the restart lockout: no retry while the ND switch is open.
    let lockout = app.current_config().restart_lockout_secs;
    for _ in 0..(lockout * 2) {
        app.tick(&mut hw, &NOON, &mut sink);
        assert_eq!(app.state(), WpState::ErrorP);
        let out = hw.relays();
        assert!(out.alarm);
        assert!(!out.compressor_on());
    }
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FaultDetected(_))), 1);

    hw.di.low_pressure = false;
    app.tick(&mut hw, &NOON, &mut sink);
    assert_eq!(app.state(), WpState::Idle);
    assert!(!hw.relays().alarm);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FaultCleared)), 1);
}

#[test]
fn contactor_that_never_pulls_in_is_not_retried() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.feedback_wired = false;
    assert!(run_until(&mut app, &mut hw, &mut sink, WpState::ErrorM, 8));

    let lockout = app.current_config().restart_lockout_secs;
    for _ in 0..(lockout * 2) {
        app.tick(&mut hw, &NOON, &mut sink);
        assert_eq!(app.state(), WpState::ErrorM);
        assert!(hw.relays().alarm);
        assert!(!hw.relays().compressor_on());
    }
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::StateChanged { to: WpState::Start, .. })),
        1
    );

    // Contactor repaired, operator resets.
    hw.feedback_wired = true;
    app.handle_command(AppCommand::AcknowledgeFaults, &mut sink).unwrap();
    app.tick(&mut hw, &NOON, &mut sink);
    assert_eq!(app.state(), WpState::Idle);
    assert_eq!(app.fault_flags(), 0);
    assert!(!hw.relays().alarm);
}

#[test]
fn acknowledge_clears_fault_history() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.di.high_pressure = true;
    run(&mut app, &mut hw, &mut sink, 2);
    hw.di.high_pressure = false;
    run(&mut app, &mut hw, &mut sink, 2);
    assert!(app.fault_history().count() > 0);

    app.handle_command(AppCommand::AcknowledgeFaults, &mut sink).unwrap();
    assert_eq!(app.fault_history().count(), 0);
}

// ── Outputs ──────────────────────────────────────────────────

#[test]
fn failed_apply_switches_everything_off() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.fail_apply = Some(ActuatorError::GpioWriteFailed);
    app.tick(&mut hw, &NOON, &mut sink);
    assert_eq!(hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ActuatorFailure(ActuatorError::GpioWriteFailed))),
        1
    );
    assert!(!app.outputs().compressor_on());
}

#[test]
fn contactors_are_never_closed_together() {
    let (mut app, mut hw, mut sink) = make_app();
    run(&mut app, &mut hw, &mut sink, 300);
    assert!(hw.calls.iter().all(|c| match c {
        ActuatorCall::Apply(o) => !(o.k_start && o.k_run),
        ActuatorCall::AllOff => true,
    }));
}

// ── Modes ────────────────────────────────────────────────────

#[test]
fn off_mode_stops_the_heat_pump() {
    let (mut app, mut hw, mut sink) = make_app();
    assert!(run_until(&mut app, &mut hw, &mut sink, WpState::Run, 5));

    app.handle_command(AppCommand::SetMode(OperatingMode::Off), &mut sink).unwrap();
    app.tick(&mut hw, &NOON, &mut sink);
    assert_eq!(app.state(), WpState::Stop);
    assert!(!hw.relays().compressor_on());
    assert!(!app.status().auto_mode);
}

#[test]
fn manual_mode_runs_compressor_on_request() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.temps.storage_c = 60.0;
    app.handle_command(AppCommand::SetMode(OperatingMode::Manual), &mut sink).unwrap();
    app.handle_command(AppCommand::ManualRequest(WpRequest::Laden), &mut sink).unwrap();

    assert!(run_until(&mut app, &mut hw, &mut sink, WpState::Run, 5));
    let out = hw.relays();
    assert!(out.k_run && out.charge_pump);
    assert!(app.status().manual_mode);

    app.handle_command(AppCommand::ManualRequest(WpRequest::Halt), &mut sink).unwrap();
    app.tick(&mut hw, &NOON, &mut sink);
    assert_eq!(app.state(), WpState::Stop);
}

#[test]
fn leaving_manual_mode_drops_manual_request() {
    let (mut app, _hw, mut sink) = make_app();
    app.handle_command(AppCommand::SetMode(OperatingMode::Manual), &mut sink).unwrap();
    app.handle_command(AppCommand::ManualRequest(WpRequest::Laden), &mut sink).unwrap();
    app.handle_command(AppCommand::SetMode(OperatingMode::Auto), &mut sink).unwrap();
    assert_eq!(
        app.handle_command(AppCommand::ManualRequest(WpRequest::Laden), &mut sink),
        Err(Error::Rejected("manual request outside manual mode"))
    );
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ModeChanged(_))), 2);
}

// ── Configuration ────────────────────────────────────────────

#[test]
fn runtime_config_update_takes_effect() {
    let (mut app, mut hw, mut sink) = make_app();
    let cfg = SystemConfig {
        storage_min_c: 20.0,
        charge_margin_c: 0.0,
        flow_max_c: 22.0,
        flow_min_c: 15.0,
        ..SystemConfig::default()
    };
    app.handle_command(AppCommand::UpdateConfig(cfg), &mut sink).unwrap();
    run(&mut app, &mut hw, &mut sink, 5);
    assert!(app.flow_setpoint_c() <= 22.0);
    // 25 °C storage is already above a 22 °C setpoint.
    assert_eq!(app.state(), WpState::Idle);
    assert_eq!(app.charge_state(), ChargeState::Idle);
}

#[test]
fn telemetry_carries_packed_words() {
    let (mut app, mut hw, mut sink) = make_app();
    assert!(run_until(&mut app, &mut hw, &mut sink, WpState::Run, 5));
    let t = app.build_telemetry();
    assert_eq!(t.hp_state, WpState::Run);
    assert_eq!(t.status_bits, app.status().bits());
    assert_ne!(t.di_bits & (1 << 4), 0, "run contactor feedback bit");
    let json = serde_json::to_string(&t).unwrap();
    assert!(json.contains("\"hp_state\":\"Run\""));
}
