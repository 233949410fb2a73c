//! Environment sensor adapters.
//!
//! The temperature / humidity / pressure part is an external collaborator;
//! only its [`EnvironmentPort`] boundary lives here.
//!
//! - [`NoEnvironmentSensor`]: board without the sensor fitted.  Every read
//!   fails with [`SensorError::NotPresent`], so M001 gets no reply and the
//!   periodic environment multicast is skipped.
//! - [`SimEnvironmentSensor`]: fixed station values for host runs and
//!   tests.
//!
//! Both derive the dew point and the sea-level pressure the same way a
//! real driver would report them.

use log::warn;

use crate::app::ports::{EnvironmentPort, EnvironmentReading};
use crate::error::SensorError;

/// Dew point (°C) from temperature and relative humidity, Magnus form.
pub fn dewpoint_c(temperature_c: f32, humidity_pct: f32) -> f32 {
    const B: f32 = 17.62;
    const C: f32 = 243.12;
    let rh = humidity_pct.clamp(0.1, 100.0) / 100.0;
    let gamma = rh.ln() + B * temperature_c / (C + temperature_c);
    C * gamma / (B - gamma)
}

/// Station pressure reduced to sea level with the barometric formula.
pub fn sea_level_hpa(station_hpa: f32, altitude_m: f32) -> f32 {
    station_hpa / (1.0 - altitude_m / 44_330.0).powf(5.255)
}

// ───────────────────────────────────────────────────────────────
// Absent sensor
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct NoEnvironmentSensor {
    warned: bool,
}

impl NoEnvironmentSensor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnvironmentPort for NoEnvironmentSensor {
    fn read(&mut self) -> Result<EnvironmentReading, SensorError> {
        if !self.warned {
            warn!("Env: no environment sensor fitted");
            self.warned = true;
        }
        Err(SensorError::NotPresent)
    }
}

// ───────────────────────────────────────────────────────────────
// Simulated sensor
// ───────────────────────────────────────────────────────────────

pub struct SimEnvironmentSensor {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub station_hpa: f32,
    altitude_m: f32,
    /// Fail the next read (test hook).
    pub fail_next: bool,
}

impl SimEnvironmentSensor {
    pub fn new(altitude_m: f32) -> Self {
        Self {
            temperature_c: 21.5,
            humidity_pct: 48.0,
            station_hpa: 997.7,
            altitude_m,
            fail_next: false,
        }
    }
}

impl EnvironmentPort for SimEnvironmentSensor {
    fn read(&mut self) -> Result<EnvironmentReading, SensorError> {
        if core::mem::take(&mut self.fail_next) {
            return Err(SensorError::ReadFailed);
        }
        if !(0.0..=100.0).contains(&self.humidity_pct) {
            return Err(SensorError::OutOfRange);
        }
        Ok(EnvironmentReading {
            temperature_c: self.temperature_c,
            humidity_pct: self.humidity_pct,
            dewpoint_c: dewpoint_c(self.temperature_c, self.humidity_pct),
            pressure_hpa: sea_level_hpa(self.station_hpa, self.altitude_m),
        })
    }
}
