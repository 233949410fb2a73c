//! RGB status LED driver.
//!
//! Three LEDC PWM channels (CH0-2) drive a common-cathode RGB LED.  The
//! [`StatusIndicator`] request is held by a [`LedPatternEngine`]; the
//! poll loop calls [`StatusLed::refresh`] once per tick to advance the
//! flash cycle and write the frame.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives three LEDC PWM channels via hw_init.
//! On host/test: tracks state in-memory only.

use crate::app::ports::{Rgb, StatusIndicator};
use crate::drivers::hw_init;
use crate::drivers::led_patterns::LedPatternEngine;

#[derive(Default)]
pub struct StatusLed {
    engine: LedPatternEngine,
    current: Rgb,
}

impl StatusLed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one poll tick and drive the LED.
    pub fn refresh(&mut self) {
        let frame = self.engine.tick();
        if frame != self.current {
            self.write(frame);
        }
    }

    pub fn off(&mut self) {
        self.engine.set((0, 0, 0), 0);
        self.write((0, 0, 0));
    }

    pub fn current_colour(&self) -> Rgb {
        self.current
    }

    fn write(&mut self, (r, g, b): Rgb) {
        hw_init::ledc_set(hw_init::LEDC_CH_LED_R, r);
        hw_init::ledc_set(hw_init::LEDC_CH_LED_G, g);
        hw_init::ledc_set(hw_init::LEDC_CH_LED_B, b);
        self.current = (r, g, b);
    }
}

impl StatusIndicator for StatusLed {
    fn set(&mut self, colour: Rgb, flash_period: u8) {
        self.engine.set(colour, flash_period);
    }
}
