//! Polarity-aware digital output (relay coil, buzzer, indicator).
//!
//! Writes are fire-and-forget: a GPIO write has no failure mode the
//! controller could react to, so pin errors are discarded.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

pub struct ActuatorLine<P> {
    pin: P,
    line: i32,
    active_high: bool,
    asserted: bool,
    last_write_ms: u32,
}

impl<P: OutputPin> ActuatorLine<P> {
    /// Wrap `pin` and immediately drive it to the inactive level.
    pub fn new(pin: P, line: i32, active_high: bool) -> Self {
        let mut out = Self {
            pin,
            line,
            active_high,
            asserted: true,
            last_write_ms: 0,
        };
        out.off(0);
        out
    }

    pub fn on(&mut self, now_ms: u32) {
        self.write(true, now_ms);
    }

    pub fn off(&mut self, now_ms: u32) {
        self.write(false, now_ms);
    }

    /// Assert for `duration_ms`, then release.  Blocks for the duration.
    pub fn pulse(&mut self, duration_ms: u32, delay: &mut impl DelayNs, now_ms: u32) {
        self.on(now_ms);
        delay.delay_ms(duration_ms);
        self.off(now_ms.wrapping_add(duration_ms));
    }

    pub fn is_on(&self) -> bool {
        self.asserted
    }

    pub fn line(&self) -> i32 {
        self.line
    }

    pub fn last_write_ms(&self) -> u32 {
        self.last_write_ms
    }

    fn write(&mut self, asserted: bool, now_ms: u32) {
        let high = asserted == self.active_high;
        let _ = if high { self.pin.set_high() } else { self.pin.set_low() };
        self.asserted = asserted;
        self.last_write_ms = now_ms;
    }
}
