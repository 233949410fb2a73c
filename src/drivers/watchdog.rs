//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the controller if the main loop
//! stalls for more than 10 seconds.
//!
//! The main loop must call `feed()` on every poll iteration.  Blocking
//! calls that can exceed the timeout (the WiFi association loop) call
//! [`feed_current_task`] between their own steps.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

pub const TIMEOUT_MS: u32 = 10_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    /// Initialise and subscribe the current task to the TWDT.
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: TIMEOUT_MS,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK as esp_err_t {
                    warn!("Watchdog: reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK as esp_err_t;
                if subscribed {
                    info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", TIMEOUT_MS);
                } else {
                    warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): no-op");
            Self {}
        }
    }

    /// Feed the watchdog. Must be called at least every 10 seconds.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                feed_current_task();
            }
        }
    }
}

/// Reset the TWDT for the calling task, if it is subscribed.
///
/// Returns silently when the task is not subscribed.
pub fn feed_current_task() {
    #[cfg(target_os = "espidf")]
    unsafe {
        esp_task_wdt_reset();
    }
}

/// Software reset of the whole controller.
#[cfg(target_os = "espidf")]
pub fn restart() -> ! {
    warn!("Watchdog: restarting controller");
    unsafe { esp_restart() }
}

/// Simulation: a restart ends the process.
#[cfg(not(target_os = "espidf"))]
pub fn restart() -> ! {
    warn!("Watchdog(sim): restart requested, exiting");
    std::process::exit(0)
}
