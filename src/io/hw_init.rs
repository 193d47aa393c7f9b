//! One-shot peripheral initialization.
//!
//! Configures the ADC1 oneshot unit for the four NTC channels and the GPIO
//! directions for the input and relay banks, using raw ESP-IDF sys calls.
//! Called once from `main()` before the control loop starts. The host build
//! replaces the ADC with a settable table so the sensor path stays testable.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    InputInitFailed,
    OutputInitFailed,
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::InputInitFailed      => write!(f, "digital inputs unreadable during setup"),
            Self::OutputInitFailed     => write!(f, "relay outputs could not be switched off"),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path. `init_adc()` completes before the loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
pub fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for &ch in &pins::TEMPERATURE_CHANNELS {
        // SAFETY: handle initialised above; single-threaded boot path.
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), ch, &chan_cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }
    }

    info!("hw_init: ADC1 configured (CH0-3 = outdoor, condenser, storage, flow)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_adc() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ADC init skipped");
    Ok(())
}

/// Read one raw 12-bit sample, `None` when the driver reports an error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract: single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.max(0) as u16)
}

#[cfg(not(target_os = "espidf"))]
static SIM_ADC: [core::sync::atomic::AtomicI32; 4] = [
    core::sync::atomic::AtomicI32::new(2048),
    core::sync::atomic::AtomicI32::new(2048),
    core::sync::atomic::AtomicI32::new(2048),
    core::sync::atomic::AtomicI32::new(2048),
];

/// Host builds read from a settable table; a negative value simulates a
/// driver error.
#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let raw = SIM_ADC
        .get(channel as usize)?
        .load(core::sync::atomic::Ordering::Relaxed);
    u16::try_from(raw).ok()
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: u32, raw: i32) {
    if let Some(slot) = SIM_ADC.get(channel as usize) {
        slot.store(raw, core::sync::atomic::Ordering::Relaxed);
    }
}

// ── GPIO ──────────────────────────────────────────────────────

/// Driver error code from a raw GPIO call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(pub i32);

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Configured input GPIO.
#[cfg(target_os = "espidf")]
pub struct GpioIn(i32);

/// Configured relay output GPIO.
#[cfg(target_os = "espidf")]
pub struct GpioOut(i32);

#[cfg(target_os = "espidf")]
impl embedded_hal::digital::ErrorType for GpioIn {
    type Error = GpioError;
}

#[cfg(target_os = "espidf")]
impl embedded_hal::digital::InputPin for GpioIn {
    fn is_high(&mut self) -> Result<bool, GpioError> {
        // SAFETY: read-only register access on a configured input pin.
        Ok(unsafe { gpio_get_level(self.0) } != 0)
    }

    fn is_low(&mut self) -> Result<bool, GpioError> {
        self.is_high().map(|h| !h)
    }
}

#[cfg(target_os = "espidf")]
impl embedded_hal::digital::ErrorType for GpioOut {
    type Error = GpioError;
}

#[cfg(target_os = "espidf")]
impl embedded_hal::digital::OutputPin for GpioOut {
    fn set_low(&mut self) -> Result<(), GpioError> {
        gpio_write(self.0, false)
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        gpio_write(self.0, true)
    }
}

#[cfg(target_os = "espidf")]
fn gpio_write(pin: i32, high: bool) -> Result<(), GpioError> {
    // SAFETY: pin was configured as output in init_gpio(); main loop only.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret != ESP_OK as i32 { return Err(GpioError(ret)); }
    Ok(())
}

#[cfg(target_os = "espidf")]
fn configure(pin: i32, mode: gpio_mode_t, pull_up: bool) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode,
        pull_up_en: if pull_up {
            gpio_pullup_t_GPIO_PULLUP_ENABLE
        } else {
            gpio_pullup_t_GPIO_PULLUP_DISABLE
        },
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: called once per pin from the boot path.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    Ok(())
}

/// Configure both GPIO banks and hand them out in `DiStates` / `Outputs`
/// order, ready for [`crate::io::setup_steuer_io`].
#[cfg(target_os = "espidf")]
pub fn init_gpio() -> Result<([GpioIn; 8], [GpioOut; 12]), HwInitError> {
    for &pin in &pins::DIGITAL_INPUTS {
        configure(pin, gpio_mode_t_GPIO_MODE_INPUT, true)?;
    }
    for &pin in &pins::DIGITAL_OUTPUTS {
        configure(pin, gpio_mode_t_GPIO_MODE_OUTPUT, false)?;
    }
    info!("hw_init: {} inputs, {} outputs configured",
          pins::DIGITAL_INPUTS.len(), pins::DIGITAL_OUTPUTS.len());
    Ok((
        pins::DIGITAL_INPUTS.map(GpioIn),
        pins::DIGITAL_OUTPUTS.map(GpioOut),
    ))
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn sim_adc_reports_negative_as_error() {
        sim_set_adc(3, -1);
        assert_eq!(adc1_read(3), None);
        sim_set_adc(3, 1234);
        assert_eq!(adc1_read(3), Some(1234));
        sim_set_adc(3, 2048);
    }

    #[test]
    fn unknown_channel_reads_none() {
        assert_eq!(adc1_read(9), None);
    }
}
