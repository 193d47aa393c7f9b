//! GPIO / peripheral pin assignments for the heat-pump controller board.
//!
//! Single source of truth; every driver references this module rather than
//! hard-coding pin numbers. Digital inputs are opto-isolated 24 V channels,
//! digital outputs drive the relay/contactor coils through a ULN2803.

// ---------------------------------------------------------------------------
// Digital inputs (opto-isolated, active LOW = contact closed)
// ---------------------------------------------------------------------------

/// Low-pressure switch (ND). Contact opens on low pressure.
pub const DI_LOW_PRESSURE_GPIO: i32 = 5;
/// High-pressure switch (HD). Contact opens on high pressure.
pub const DI_HIGH_PRESSURE_GPIO: i32 = 6;
/// Compressor motor protection switch. Contact opens when tripped.
pub const DI_MOTOR_PROTECTION_GPIO: i32 = 7;
/// Auxiliary contact of the start contactor.
pub const DI_K_START_GPIO: i32 = 15;
/// Auxiliary contact of the run contactor.
pub const DI_K_RUN_GPIO: i32 = 16;
/// Utility tariff lock signal (EW). Contact closed = lock active.
pub const DI_TARIFF_LOCK_GPIO: i32 = 17;
pub const DI_RESERVE1_GPIO: i32 = 18;
pub const DI_RESERVE2_GPIO: i32 = 47;

/// All digital inputs in `DiStates` bit order.
pub const DIGITAL_INPUTS: [i32; 8] = [
    DI_LOW_PRESSURE_GPIO,
    DI_HIGH_PRESSURE_GPIO,
    DI_MOTOR_PROTECTION_GPIO,
    DI_K_START_GPIO,
    DI_K_RUN_GPIO,
    DI_TARIFF_LOCK_GPIO,
    DI_RESERVE1_GPIO,
    DI_RESERVE2_GPIO,
];

// ---------------------------------------------------------------------------
// Digital outputs (active HIGH = relay energised)
// ---------------------------------------------------------------------------

/// Compressor crankcase heater.
pub const DO_CRANKCASE_HEATER_GPIO: i32 = 8;
/// Start contactor.
pub const DO_K_START_GPIO: i32 = 9;
/// Run contactor.
pub const DO_K_RUN_GPIO: i32 = 10;
/// Hot-gas bypass valve (defrost).
pub const DO_BYPASS_GPIO: i32 = 11;
/// Evaporator fan.
pub const DO_FAN_GPIO: i32 = 12;
/// Storage charge pump.
pub const DO_CHARGE_PUMP_GPIO: i32 = 13;
/// Heating circuit circulation pump.
pub const DO_HEATING_PUMP_GPIO: i32 = 14;
/// Mixing valve actuator: open (raise flow temperature).
pub const DO_MIXER_OPEN_GPIO: i32 = 21;
/// Mixing valve actuator: close (lower flow temperature).
pub const DO_MIXER_CLOSE_GPIO: i32 = 38;
/// Collective alarm relay.
pub const DO_ALARM_GPIO: i32 = 39;
pub const DO_RESERVE1_GPIO: i32 = 40;
pub const DO_RESERVE2_GPIO: i32 = 41;

/// All digital outputs in `Outputs` order.
pub const DIGITAL_OUTPUTS: [i32; 12] = [
    DO_CRANKCASE_HEATER_GPIO,
    DO_K_START_GPIO,
    DO_K_RUN_GPIO,
    DO_BYPASS_GPIO,
    DO_FAN_GPIO,
    DO_CHARGE_PUMP_GPIO,
    DO_HEATING_PUMP_GPIO,
    DO_MIXER_OPEN_GPIO,
    DO_MIXER_CLOSE_GPIO,
    DO_ALARM_GPIO,
    DO_RESERVE1_GPIO,
    DO_RESERVE2_GPIO,
];

// ---------------------------------------------------------------------------
// Temperature inputs (ADC1, NTC 10 kΩ voltage dividers)
// ---------------------------------------------------------------------------

/// Outdoor temperature sensor: ADC1 channel 0 (GPIO 1).
pub const ADC1_CH_OUTDOOR: u32 = 0;
/// Condenser return temperature sensor: ADC1 channel 1 (GPIO 2).
pub const ADC1_CH_CONDENSER: u32 = 1;
/// Storage tank temperature sensor: ADC1 channel 2 (GPIO 3).
pub const ADC1_CH_STORAGE: u32 = 2;
/// Heating flow temperature sensor: ADC1 channel 3 (GPIO 4).
pub const ADC1_CH_FLOW: u32 = 3;

/// All temperature channels in `Temperatures` order.
pub const TEMPERATURE_CHANNELS: [u32; 4] = [
    ADC1_CH_OUTDOOR,
    ADC1_CH_CONDENSER,
    ADC1_CH_STORAGE,
    ADC1_CH_FLOW,
];
