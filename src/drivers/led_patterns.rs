//! LED flash engine.
//!
//! Turns a `(colour, flash_period)` request into one RGB frame per poll
//! tick.  The main loop calls `tick()` once per iteration and feeds the
//! result to the LEDC channels.
//!
//! | Period | Output                                             |
//! |--------|----------------------------------------------------|
//! | 0      | Solid colour                                       |
//! | P > 0  | Colour for the first `ceil(P/2)` ticks, then dark  |
//!
//! A request that differs from the active one restarts the cycle, so a new
//! pattern always begins lit.  Repeating the active request does not.

use crate::app::ports::Rgb;

const OFF: Rgb = (0, 0, 0);

/// LED flash engine. Stack-allocated, no heap.
pub struct LedPatternEngine {
    colour: Rgb,
    period: u8,
    phase: u8,
}

impl Default for LedPatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LedPatternEngine {
    pub fn new() -> Self {
        Self {
            colour: OFF,
            period: 0,
            phase: 0,
        }
    }

    pub fn set(&mut self, colour: Rgb, period: u8) {
        if (colour, period) != (self.colour, self.period) {
            self.colour = colour;
            self.period = period;
            self.phase = 0;
        }
    }

    /// Current request.
    pub fn pattern(&self) -> (Rgb, u8) {
        (self.colour, self.period)
    }

    /// Frame for this tick, then advance one tick.
    pub fn tick(&mut self) -> Rgb {
        if self.period == 0 {
            return self.colour;
        }
        let lit = self.phase < self.period.div_ceil(2);
        self.phase = (self.phase + 1) % self.period;
        if lit { self.colour } else { OFF }
    }
}
