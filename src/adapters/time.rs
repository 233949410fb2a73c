//! ESP32 time adapter.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` for uptime
//!   and `gettimeofday()` for wall-clock.  `main` starts SNTP on the first
//!   station link; until it syncs, [`ClockPort::epoch_secs`] reports 0.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` and
//!   `SystemTime` for host-side simulation.

use crate::app::ports::ClockPort;

/// Anything before 2020-01-01 means SNTP has not run yet.
const EPOCH_2020: u64 = 1_577_836_800;

/// Time adapter for the ESP32-S3 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    #[cfg(target_os = "espidf")]
    fn wall_clock_secs(&self) -> u64 {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return 0;
        }
        u64::try_from(tv.tv_sec).unwrap_or(0)
    }

    #[cfg(not(target_os = "espidf"))]
    fn wall_clock_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs())
    }
}

impl ClockPort for Esp32TimeAdapter {
    fn now_ms(&self) -> u32 {
        // Truncation is the intended wrap.
        (self.uptime_us() / 1_000) as u32
    }

    fn epoch_secs(&self) -> u64 {
        synced_epoch(self.wall_clock_secs())
    }
}

/// Wall-clock seconds, or 0 while the clock still reads as unsynchronised.
fn synced_epoch(secs: u64) -> u64 {
    if secs < EPOCH_2020 { 0 } else { secs }
}

/// Interrupt-context timestamp in the same millisecond base as
/// [`ClockPort::now_ms`].
#[cfg(target_os = "espidf")]
pub fn isr_now_ms() -> u32 {
    // SAFETY: esp_timer_get_time is a counter read; safe in ISR context.
    ((unsafe { esp_idf_svc::sys::esp_timer_get_time() }) / 1_000) as u32
}
