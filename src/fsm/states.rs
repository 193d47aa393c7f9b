//! Concrete heat-pump state handlers and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  IDLE ──[LADEN/DEFROST, no lock]──▶ START ──[start_secs]──▶ RUN
//!    ▲                                  │                     │  ▲
//!    │                                [halt]     [defrost req] │  │ [req gone / timeout]
//!    │                                  ▼                     ▼  │
//!    └──────[fan overrun done]────── STOP ◀──[halt]──────── DEFROST
//!
//!  Any state ──[pressure fault]──▶ ERROR_P ──[machine fault]──▶ ERROR_M
//!  Any state ──[machine fault]───▶ ERROR_M ──[faults cleared]─▶ IDLE
//! ```
//!
//! Every normal state checks the fault mask first so a fault always wins
//! over the requested function. Stops and errors record the stop tick,
//! which arms the restart lockout checked in IDLE.

use super::context::{CompressorCommands, FsmContext};
use super::{StateDescriptor, WpRequest, WpState};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table. Called once at startup.
pub fn build_state_table() -> [StateDescriptor; WpState::COUNT] {
    [
        StateDescriptor {
            id: WpState::Idle,
            name: "IDLE",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        StateDescriptor {
            id: WpState::Start,
            name: "START",
            on_enter: Some(start_enter),
            on_exit: None,
            on_update: start_update,
        },
        StateDescriptor {
            id: WpState::Run,
            name: "RUN",
            on_enter: Some(run_enter),
            on_exit: None,
            on_update: run_update,
        },
        StateDescriptor {
            id: WpState::Stop,
            name: "STOP",
            on_enter: Some(stop_enter),
            on_exit: Some(stop_exit),
            on_update: stop_update,
        },
        StateDescriptor {
            id: WpState::Defrost,
            name: "DEFROST",
            on_enter: Some(defrost_enter),
            on_exit: Some(defrost_exit),
            on_update: defrost_update,
        },
        StateDescriptor {
            id: WpState::ErrorP,
            name: "ERROR_P",
            on_enter: Some(error_enter),
            on_exit: Some(error_exit),
            on_update: error_p_update,
        },
        StateDescriptor {
            id: WpState::ErrorM,
            name: "ERROR_M",
            on_enter: Some(error_enter),
            on_exit: Some(error_exit),
            on_update: error_m_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    // Compressor at rest: keep the oil warm.
    ctx.commands = CompressorCommands {
        crankcase_heater: true,
        ..CompressorCommands::all_off()
    };
}

fn idle_update(ctx: &mut FsmContext) -> Option<WpState> {
    if let Some(err) = ctx.error_target() {
        return Some(err);
    }
    let wanted = matches!(ctx.request, WpRequest::Laden | WpRequest::Defrost);
    if wanted && !ctx.sensors.di.tariff_lock && !ctx.restart_locked() {
        return Some(WpState::Start);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  START
// ═══════════════════════════════════════════════════════════════════════════

fn start_enter(ctx: &mut FsmContext) {
    ctx.commands = CompressorCommands {
        k_start: true,
        ..CompressorCommands::all_off()
    };
    ctx.compressor_started_tick = Some(ctx.total_ticks);
}

fn start_update(ctx: &mut FsmContext) -> Option<WpState> {
    if let Some(err) = ctx.error_target() {
        return Some(err);
    }
    if ctx.stop_requested() {
        return Some(WpState::Stop);
    }
    if ctx.secs_in_state() >= ctx.config.start_secs {
        return Some(WpState::Run);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUN
// ═══════════════════════════════════════════════════════════════════════════

fn run_enter(ctx: &mut FsmContext) {
    // Start and run contactor swap in the same tick; never both.
    ctx.commands = CompressorCommands {
        k_run: true,
        fan: true,
        ..CompressorCommands::all_off()
    };
}

fn run_update(ctx: &mut FsmContext) -> Option<WpState> {
    if let Some(err) = ctx.error_target() {
        return Some(err);
    }
    if ctx.stop_requested() {
        return Some(WpState::Stop);
    }
    if ctx.request != WpRequest::Defrost {
        ctx.defrost_timed_out = false;
        return None;
    }
    let ran = ctx.secs_since_compressor_start().unwrap_or(0.0);
    if !ctx.defrost_timed_out && ran >= ctx.config.defrost_lock_secs as f32 {
        return Some(WpState::Defrost);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  DEFROST
// ═══════════════════════════════════════════════════════════════════════════

fn defrost_enter(ctx: &mut FsmContext) {
    // Hot gas through the evaporator, fan stopped.
    ctx.commands.fan = false;
    ctx.commands.bypass = true;
}

fn defrost_exit(ctx: &mut FsmContext) {
    ctx.commands.bypass = false;
}

fn defrost_update(ctx: &mut FsmContext) -> Option<WpState> {
    if let Some(err) = ctx.error_target() {
        return Some(err);
    }
    if ctx.stop_requested() {
        return Some(WpState::Stop);
    }
    if ctx.request != WpRequest::Defrost {
        return Some(WpState::Run);
    }
    if ctx.secs_in_state() >= f32::from(ctx.config.defrost_max_secs) {
        warn!("defrost hit {} s limit, back to RUN", ctx.config.defrost_max_secs);
        ctx.defrost_timed_out = true;
        return Some(WpState::Run);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  STOP
// ═══════════════════════════════════════════════════════════════════════════

fn stop_enter(ctx: &mut FsmContext) {
    ctx.note_compressor_stop();
    // Fan runs on to clear the evaporator.
    ctx.commands = CompressorCommands {
        crankcase_heater: true,
        fan: true,
        ..CompressorCommands::all_off()
    };
}

fn stop_exit(ctx: &mut FsmContext) {
    ctx.commands.fan = false;
}

fn stop_update(ctx: &mut FsmContext) -> Option<WpState> {
    if let Some(err) = ctx.error_target() {
        return Some(err);
    }
    if ctx.secs_in_state() >= f32::from(ctx.config.fan_overrun_secs) {
        return Some(WpState::Idle);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR_P / ERROR_M
// ═══════════════════════════════════════════════════════════════════════════

fn error_enter(ctx: &mut FsmContext) {
    ctx.note_compressor_stop();
    ctx.commands = CompressorCommands {
        crankcase_heater: true,
        alarm: true,
        ..CompressorCommands::all_off()
    };
    warn!("heat pump fault: flags=0b{:04b}", ctx.fault_flags);
}

fn error_exit(ctx: &mut FsmContext) {
    ctx.commands.alarm = false;
}

fn error_p_update(ctx: &mut FsmContext) -> Option<WpState> {
    match ctx.error_target() {
        Some(WpState::ErrorM) => Some(WpState::ErrorM),
        Some(_) => None,
        None => {
            info!("pressure fault cleared");
            Some(WpState::Idle)
        }
    }
}

fn error_m_update(ctx: &mut FsmContext) -> Option<WpState> {
    match ctx.error_target() {
        Some(WpState::ErrorM) => None,
        Some(other) => Some(other),
        None => {
            info!("machine fault cleared");
            Some(WpState::Idle)
        }
    }
}
