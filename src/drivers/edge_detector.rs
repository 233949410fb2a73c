//! Debounced, duration-validated digital input.
//!
//! One `EdgeDetector` watches one GPIO line.  The GPIO ISR calls
//! [`EdgeDetector::on_transition`] with the raw level on every edge; the
//! detector classifies the edge and keeps a "matched" flag (debounced level
//! equals the active polarity) plus statistics.
//!
//! ## Classification
//!
//! | Condition                                   | Result      |
//! |---------------------------------------------|-------------|
//! | raw level equals the last raw level         | `Unchanged` |
//! | less than `debounce_ms` since last edge     | `Spurious`  |
//! | entering the active level                   | `Matched`   |
//! | leaving it within `max_matched_ms` (or 0)   | `Unmatched` |
//! | leaving it after `max_matched_ms`           | `Spurious`  |
//!
//! Every field the ISR writes is a separate atomic with relaxed ordering.
//! Readers get per-field consistency only: a telemetry dump taken while an
//! edge is being classified may be one step stale on some counters.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Hook invoked from interrupt context.  Must not block.
pub type Hook = fn();

fn no_hook() {}

/// Outcome of a single [`EdgeDetector::on_transition`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Spurious,
    Matched,
    Unmatched,
}

/// Counter snapshot, read field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeStats {
    pub invoked: u32,
    pub discarded_unchanged: u32,
    pub matched: u32,
    pub unmatched: u32,
    pub spurious: u32,
    pub last_matched_duration_ms: u32,
}

impl fmt::Display for EdgeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} : {} : {} : {} : {}",
            self.invoked, self.discarded_unchanged, self.matched, self.unmatched, self.spurious
        )
    }
}

pub struct EdgeDetector {
    line: i32,
    active_high: bool,
    debounce_ms: u32,
    max_matched_ms: u32,
    on_match: Hook,
    on_unmatch: Hook,

    last_raw: AtomicBool,
    last_transition_ms: AtomicU32,
    matched_now: AtomicBool,

    invoked: AtomicU32,
    discarded_unchanged: AtomicU32,
    matched: AtomicU32,
    unmatched: AtomicU32,
    spurious: AtomicU32,
    last_matched_duration_ms: AtomicU32,
}

impl EdgeDetector {
    /// Detector for `line`, starting at the inactive level at t=0.
    pub fn new(line: i32, active_high: bool, debounce_ms: u32, max_matched_ms: u32) -> Self {
        Self {
            line,
            active_high,
            debounce_ms,
            max_matched_ms,
            on_match: no_hook,
            on_unmatch: no_hook,
            last_raw: AtomicBool::new(!active_high),
            last_transition_ms: AtomicU32::new(0),
            matched_now: AtomicBool::new(false),
            invoked: AtomicU32::new(0),
            discarded_unchanged: AtomicU32::new(0),
            matched: AtomicU32::new(0),
            unmatched: AtomicU32::new(0),
            spurious: AtomicU32::new(0),
            last_matched_duration_ms: AtomicU32::new(0),
        }
    }

    pub fn with_hooks(mut self, on_match: Hook, on_unmatch: Hook) -> Self {
        self.on_match = on_match;
        self.on_unmatch = on_unmatch;
        self
    }

    /// Seed with the level read at boot, before the ISR is attached.
    pub fn seeded(self, raw: bool, now_ms: u32) -> Self {
        self.last_raw.store(raw, Ordering::Relaxed);
        self.matched_now.store(raw == self.active_high, Ordering::Relaxed);
        self.last_transition_ms.store(now_ms, Ordering::Relaxed);
        self
    }

    /// Classify one raw level notification.  Safe to call from an ISR.
    pub fn on_transition(&self, raw: bool, now_ms: u32) -> Transition {
        self.invoked.fetch_add(1, Ordering::Relaxed);

        if raw == self.last_raw.load(Ordering::Relaxed) {
            self.discarded_unchanged.fetch_add(1, Ordering::Relaxed);
            return Transition::Unchanged;
        }

        let elapsed = now_ms.wrapping_sub(self.last_transition_ms.load(Ordering::Relaxed));
        let outcome = if elapsed < self.debounce_ms {
            self.spurious.fetch_add(1, Ordering::Relaxed);
            Transition::Spurious
        } else if raw == self.active_high {
            self.matched.fetch_add(1, Ordering::Relaxed);
            self.matched_now.store(true, Ordering::Relaxed);
            (self.on_match)();
            Transition::Matched
        } else if self.max_matched_ms == 0 || elapsed < self.max_matched_ms {
            self.unmatched.fetch_add(1, Ordering::Relaxed);
            self.matched_now.store(false, Ordering::Relaxed);
            self.last_matched_duration_ms.store(elapsed, Ordering::Relaxed);
            (self.on_unmatch)();
            Transition::Unmatched
        } else {
            self.spurious.fetch_add(1, Ordering::Relaxed);
            Transition::Spurious
        };

        self.last_raw.store(raw, Ordering::Relaxed);
        self.last_transition_ms.store(now_ms, Ordering::Relaxed);
        outcome
    }

    /// Debounced state: the last classified transition.
    pub fn is_matched(&self) -> bool {
        self.matched_now.load(Ordering::Relaxed)
    }

    /// Unfiltered: the most recent raw level equals the active polarity.
    pub fn current_reading(&self) -> bool {
        self.last_raw.load(Ordering::Relaxed) == self.active_high
    }

    pub fn line(&self) -> i32 {
        self.line
    }

    pub fn matched_count(&self) -> u32 {
        self.matched.load(Ordering::Relaxed)
    }

    pub fn unmatched_count(&self) -> u32 {
        self.unmatched.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> EdgeStats {
        EdgeStats {
            invoked: self.invoked.load(Ordering::Relaxed),
            discarded_unchanged: self.discarded_unchanged.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            unmatched: self.unmatched.load(Ordering::Relaxed),
            spurious: self.spurious.load(Ordering::Relaxed),
            last_matched_duration_ms: self.last_matched_duration_ms.load(Ordering::Relaxed),
        }
    }
}
