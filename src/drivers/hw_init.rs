//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions, LEDC timer/channels for the status LED and
//! the per-line GPIO interrupts using raw ESP-IDF sys calls.  Called once
//! from `main()` before the poll loop starts.

use core::convert::Infallible;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use embedded_hal::digital::{ErrorType, OutputPin};
use log::info;

use crate::drivers::edge_detector::{EdgeDetector, Transition};
use crate::events::{push_event, Event, SensorLine};
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcInitFailed,
    IsrInstallFailed(i32),
    IsrAttachFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed       => write!(f, "LEDC timer/channel config failed"),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrAttachFailed(pin) => write!(f, "GPIO ISR attach failed on GPIO{}", pin),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(match e {
            HwInitError::GpioConfigFailed(_) => "GPIO config failed",
            HwInitError::LedcInitFailed => "LEDC config failed",
            HwInitError::IsrInstallFailed(_) => "GPIO ISR service install failed",
            HwInitError::IsrAttachFailed(_) => "GPIO ISR attach failed",
        })
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the poll loop; single-threaded.
    unsafe {
        init_gpio_inputs()?;
        init_gpio_outputs()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

const INPUT_PINS: [i32; 4] = [
    pins::DOOR_OPEN_SENSOR_GPIO,
    pins::DOOR_CLOSED_SENSOR_GPIO,
    pins::LIGHT_SENSOR_GPIO,
    pins::MANUAL_SWITCH_GPIO,
];

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    for &pin in &INPUT_PINS {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as esp_err_t { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    info!("hw_init: GPIO inputs configured (any-edge)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe from main and ISR context.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Simulation: one bit per GPIO, settable from tests and the host binary.
#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: core::sync::atomic::AtomicU64 = core::sync::atomic::AtomicU64::new(
    (1u64 << pins::MANUAL_SWITCH_GPIO) | (1u64 << pins::DOOR_CLOSED_SENSOR_GPIO),
);

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    SIM_LEVELS.load(core::sync::atomic::Ordering::Relaxed) & (1u64 << pin) != 0
}

/// Simulation: drive an input line.  Returns the previous level.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level(pin: i32, high: bool) -> bool {
    use core::sync::atomic::Ordering;
    let bit = 1u64 << pin;
    let prev = if high {
        SIM_LEVELS.fetch_or(bit, Ordering::Relaxed)
    } else {
        SIM_LEVELS.fetch_and(!bit, Ordering::Relaxed)
    };
    prev & bit != 0
}

// ── GPIO Outputs ──────────────────────────────────────────────

const RELAY_PINS: [i32; 4] = [
    pins::OPEN_RELAY_GPIO,
    pins::CLOSE_RELAY_GPIO,
    pins::STOP_RELAY_GPIO,
    pins::LIGHT_RELAY_GPIO,
];

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    for &pin in &RELAY_PINS {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as esp_err_t { return Err(HwInitError::GpioConfigFailed(ret)); }
        // Coils released before anything else runs.
        unsafe { gpio_set_level(pin, u32::from(!pins::RELAY_ACTIVE_HIGH)) };
    }

    info!("hw_init: relay outputs configured (released)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was configured during init_gpio_outputs(). Main-loop only.
    unsafe { gpio_set_level(pin, u32::from(high)); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

/// A configured output GPIO as an `embedded-hal` pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioOutput(pub i32);

impl ErrorType for GpioOutput {
    type Error = Infallible;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.0, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.0, true);
        Ok(())
    }
}

/// The relay bank in [`Relay`](crate::door::controller::Relay) order.
pub fn relay_outputs() -> [GpioOutput; 4] {
    RELAY_PINS.map(GpioOutput)
}

// ── LEDC PWM ─────────────────────────────────────────────────

pub const LEDC_CH_LED_R: u32 = 0;
pub const LEDC_CH_LED_G: u32 = 1;
pub const LEDC_CH_LED_B: u32 = 2;

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0: RGB LED (1 kHz, 8-bit)
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::LED_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    if unsafe { ledc_timer_config(&timer0) } != ESP_OK as esp_err_t {
        return Err(HwInitError::LedcInitFailed);
    }

    let led_gpios = [pins::LED_R_GPIO, pins::LED_G_GPIO, pins::LED_B_GPIO];
    for (i, &gpio) in led_gpios.iter().enumerate() {
        let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: LEDC_CH_LED_R + i as u32,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        }) };
        if ret != ESP_OK as esp_err_t {
            return Err(HwInitError::LedcInitFailed);
        }
    }

    info!("hw_init: LEDC configured (led=CH0-2)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: LEDC channels were configured in init_ledc(); duty register
    // writes are race-free since only the main loop calls this function.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) {}

// ── GPIO ISR Service ──────────────────────────────────────────

/// Ties one monitored GPIO to its detector.  Leaked at boot and handed to
/// the ISR as its argument, so it lives for the program's lifetime.
pub struct LineBinding {
    pub gpio: i32,
    pub line: SensorLine,
    pub detector: &'static EdgeDetector,
}

/// The queue event a classified transition produces, if any.
///
/// Switch presses are not reported here: the switch detector's match hook
/// pushes [`Event::SwitchPressed`] itself.
pub fn event_for(line: SensorLine, transition: Transition) -> Option<Event> {
    match (transition, line) {
        (Transition::Unchanged, _) => None,
        (Transition::Spurious, line) => Some(Event::Spurious(line)),
        (_, SensorLine::Switch) => None,
        (_, SensorLine::Light) => Some(Event::LightEdge),
        (_, line) => Some(Event::BoundaryEdge(line)),
    }
}

/// Match hook for the manual-switch detector.
pub fn switch_pressed_hook() {
    push_event(Event::SwitchPressed);
}

/// Unmatch hook that does nothing.
pub fn ignore_hook() {}

/// Classify one level change and queue the result.  Called from the ISR.
pub fn on_line_change(binding: &LineBinding, level: bool, now_ms: u32) -> Transition {
    let transition = binding.detector.on_transition(level, now_ms);
    if let Some(event) = event_for(binding.line, transition) {
        push_event(event);
    }
    transition
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn line_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `&'static LineBinding` registered in
    // attach_line_isr(); it is never freed.
    let binding = unsafe { &*(arg as *const LineBinding) };
    let level = gpio_read(binding.gpio);
    on_line_change(binding, level, crate::adapters::time::isr_now_ms());
}

/// Install the per-pin GPIO ISR service.  Call after init_peripherals().
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: ESP_ERR_INVALID_STATE means the service was already
    // installed (acceptable).
    let ret = unsafe { gpio_install_isr_service(0) };
    if ret != ESP_OK as esp_err_t && ret != ESP_ERR_INVALID_STATE as esp_err_t {
        return Err(HwInitError::IsrInstallFailed(ret));
    }
    info!("hw_init: ISR service installed");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    info!("hw_init(sim): ISR service skipped");
    Ok(())
}

/// Register `binding` as the any-edge handler of its GPIO.
#[cfg(target_os = "espidf")]
pub fn attach_line_isr(binding: &'static LineBinding) -> Result<(), HwInitError> {
    let arg = binding as *const LineBinding as *mut core::ffi::c_void;
    // SAFETY: `binding` outlives the handler; line_isr only reads it and
    // pushes to the lock-free event queue.
    unsafe {
        gpio_set_intr_type(binding.gpio, gpio_int_type_t_GPIO_INTR_ANYEDGE);
        if gpio_isr_handler_add(binding.gpio, Some(line_isr), arg) != ESP_OK as esp_err_t {
            return Err(HwInitError::IsrAttachFailed(binding.gpio));
        }
        gpio_intr_enable(binding.gpio);
    }
    info!("hw_init: ISR attached to GPIO{} ({:?})", binding.gpio, binding.line);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn attach_line_isr(binding: &'static LineBinding) -> Result<(), HwInitError> {
    info!("hw_init(sim): GPIO{} ({:?}) polled, not interrupt driven", binding.gpio, binding.line);
    Ok(())
}
