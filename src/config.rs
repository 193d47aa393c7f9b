//! System configuration parameters
//!
//! All tunable parameters for the heat-pump controller. Timing defaults
//! follow the plant's commissioning values (start duration, pump overrun,
//! restart lockout, defrost lockout). Values can be replaced at runtime
//! with a validated JSON document.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Compressor timing ---
    /// Star/start contactor duration before switching to the run contactor (s)
    pub start_secs: f32,
    /// Minimum compressor-off time before a restart is allowed (s)
    pub restart_lockout_secs: u32,
    /// Fan run-on after the compressor stops (s)
    pub fan_overrun_secs: u16,

    // --- Defrost ---
    /// Outdoor temperature below which periodic defrost is required (°C)
    pub defrost_required_below_c: f32,
    /// Maximum charging time before a defrost must run (s)
    pub max_charge_secs: u32,
    /// No defrost within this time after compressor start (pressure build-up) (s)
    pub defrost_lock_secs: u32,
    /// Duration the charging logic requests hot-gas defrost (s)
    pub defrost_duration_secs: u16,
    /// Hard upper limit for one defrost cycle in the heat-pump FSM (s)
    pub defrost_max_secs: u16,

    // --- Safety ---
    /// Low-pressure switch ignored for this long after compressor start (s)
    pub low_pressure_bypass_secs: u16,
    /// Time a contactor may take to report its commanded position (s)
    pub contactor_grace_secs: u16,

    // --- Storage charging ---
    /// Storage setpoint above the heating flow setpoint (K)
    pub charge_margin_c: f32,
    /// Storage temperature drop below setpoint that starts a charge (K)
    pub charge_hysteresis_c: f32,
    /// Lowest storage setpoint regardless of heating demand (°C)
    pub storage_min_c: f32,
    /// Charge pump run-on after the end of a charge (s)
    pub charge_pump_overrun_secs: u32,

    // --- Heating circuit ---
    /// Heating-curve level (1–8)
    pub curve_level: u8,
    /// Parallel shift of the heating curve (K, ±)
    pub parallel_shift_c: i8,
    /// Flow temperature reduction during setback (K)
    pub reduction_c: f32,
    /// Lowest flow setpoint (°C)
    pub flow_min_c: f32,
    /// Highest flow setpoint (°C)
    pub flow_max_c: f32,
    /// Mixer full travel time 100 % -> 0 % including reserve (s)
    pub mixer_travel_secs: u32,
    /// Three-point controller gain (fraction of a cycle per K)
    pub mixer_kp: f32,
    /// Three-point controller dead band (K)
    pub mixer_e_min: f32,
    /// Three-point controller switch-off hysteresis (K)
    pub mixer_hysteresis: f32,
    /// Three-point controller pulse cycle (s)
    pub mixer_cycle_secs: f32,

    // --- Setback ---
    /// Start hour of reduced heating (0-23), `None` = no setback
    pub setback_start_hour: Option<u8>,
    /// End hour of reduced heating (0-23)
    pub setback_end_hour: u8,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Telemetry report interval (seconds)
    pub telemetry_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Compressor
            start_secs: 1.0,
            restart_lockout_secs: 900, // 15 min against short-cycling
            fan_overrun_secs: 30,

            // Defrost
            defrost_required_below_c: 10.0,
            max_charge_secs: 2400, // 40 min
            defrost_lock_secs: 210,
            defrost_duration_secs: 300,
            defrost_max_secs: 600,

            // Safety
            low_pressure_bypass_secs: 120,
            contactor_grace_secs: 2,

            // Storage
            charge_margin_c: 5.0,
            charge_hysteresis_c: 5.0,
            storage_min_c: 35.0,
            charge_pump_overrun_secs: 100,

            // Heating circuit
            curve_level: 4,
            parallel_shift_c: 0,
            reduction_c: 5.0,
            flow_min_c: 20.0,
            flow_max_c: 55.0,
            mixer_travel_secs: 155,
            mixer_kp: 0.35,
            mixer_e_min: 0.4,
            mixer_hysteresis: 0.2,
            mixer_cycle_secs: 10.0,

            // Setback
            setback_start_hour: Some(22),
            setback_end_hour: 6,

            // Timing
            control_loop_interval_ms: 1000, // 1 Hz
            telemetry_interval_secs: 60,
        }
    }
}

impl SystemConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("control_loop_interval_ms must be > 0"));
        }
        if !(self.start_secs > 0.0 && self.start_secs <= 10.0) {
            return Err(ConfigError::ValidationFailed("start_secs must be in (0, 10]"));
        }
        if self.restart_lockout_secs < 60 {
            return Err(ConfigError::ValidationFailed("restart_lockout_secs must be >= 60"));
        }
        if self.defrost_duration_secs == 0 || self.defrost_max_secs < self.defrost_duration_secs {
            return Err(ConfigError::ValidationFailed(
                "defrost_max_secs must be >= defrost_duration_secs > 0",
            ));
        }
        if self.max_charge_secs <= self.defrost_lock_secs {
            return Err(ConfigError::ValidationFailed(
                "max_charge_secs must exceed defrost_lock_secs",
            ));
        }
        if !(1..=crate::control::heating_curve::CURVE_LEVELS as u8).contains(&self.curve_level) {
            return Err(ConfigError::ValidationFailed("curve_level must be 1..=8"));
        }
        if self.flow_min_c >= self.flow_max_c {
            return Err(ConfigError::ValidationFailed("flow_min_c must be below flow_max_c"));
        }
        if self.charge_hysteresis_c <= 0.0 {
            return Err(ConfigError::ValidationFailed("charge_hysteresis_c must be > 0"));
        }
        if self.mixer_kp <= 0.0 || self.mixer_cycle_secs <= 0.0 {
            return Err(ConfigError::ValidationFailed("mixer_kp and mixer_cycle_secs must be > 0"));
        }
        if self.mixer_hysteresis < 0.0 || self.mixer_hysteresis > self.mixer_e_min {
            return Err(ConfigError::ValidationFailed(
                "mixer_hysteresis must be in [0, mixer_e_min]",
            ));
        }
        if self.setback_start_hour.is_some_and(|h| h > 23) || self.setback_end_hour > 23 {
            return Err(ConfigError::ValidationFailed("setback hours must be 0-23"));
        }
        Ok(())
    }

    /// Duration of one control tick in seconds.
    pub fn tick_secs(&self) -> f32 {
        self.control_loop_interval_ms as f32 / 1000.0
    }
}
