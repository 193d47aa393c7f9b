//! Heat-pump controller firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                    │
//! │                                                            │
//! │  HardwareAdapter       LogEventSink      EspClock          │
//! │  (Sensor+Actuator)     (EventSink)       (ClockPort)       │
//! │                                                            │
//! │  ───────────────── Port Trait Boundary ─────────────────   │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │            AppService (pure logic)                   │  │
//! │  │  Charging · Safety · WP FSM · Heating circuit        │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{error, info, warn};

use wpcontrol::adapters::hardware::HardwareAdapter;
use wpcontrol::adapters::log_sink::LogEventSink;
use wpcontrol::adapters::time::EspClock;
use wpcontrol::app::service::AppService;
use wpcontrol::config::SystemConfig;
use wpcontrol::drivers::watchdog::Watchdog;
use wpcontrol::io::{self, hw_init};
use wpcontrol::sensors::SensorHub;

/// Built-in configuration; replaced wholesale when a document is flashed
/// alongside the firmware.
const CONFIG_JSON: Option<&str> = option_env!("WPCONTROL_CONFIG_JSON");

fn load_config() -> SystemConfig {
    match CONFIG_JSON.map(SystemConfig::from_json) {
        Some(Ok(cfg)) => {
            info!("Config loaded from build-time document");
            cfg
        }
        Some(Err(e)) => {
            warn!("Config document rejected ({}), using defaults", e);
            SystemConfig::default()
        }
        None => SystemConfig::default(),
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  WP-Control v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config();

    // ── 2. Peripherals, relays off before anything else ───────
    hw_init::init_adc().context("ADC init")?;
    let (input_pins, output_pins) = hw_init::init_gpio().context("GPIO init")?;
    let control_io = io::setup_steuer_io(input_pins, output_pins).context("control I/O setup")?;

    let watchdog = Watchdog::new(config.control_loop_interval_ms.saturating_mul(10).max(5_000));

    // ── 3. Adapters + app service ─────────────────────────────
    let sensor_hub = SensorHub::new(control_io.inputs, hw_init::adc1_read);
    let mut hw = HardwareAdapter::new(sensor_hub, control_io.outputs);
    let clock = EspClock::new();
    let mut log_sink = LogEventSink::new();

    let mut app = AppService::new(config);
    app.start(&mut log_sink);

    info!("System ready. Entering control loop.");

    // ── 4. Control loop ───────────────────────────────────────
    loop {
        let period = Duration::from_millis(u64::from(app.current_config().control_loop_interval_ms));
        let started = Instant::now();

        app.tick(&mut hw, &clock, &mut log_sink);
        watchdog.feed();

        let spent = started.elapsed();
        if spent > period {
            error!("control tick overran: {} ms", spent.as_millis());
        } else {
            std::thread::sleep(period - spent);
        }
    }
}
