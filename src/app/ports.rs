//! Port traits: the hexagonal boundary between the controller logic and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GarageApp / UdpControlService (domain)
//! ```
//!
//! The network service and the application core consume these through
//! generics, so the door and protocol logic runs on the host under test
//! with mock adapters.

use core::fmt;
use core::net::{Ipv4Addr, SocketAddrV4};

use crate::config::GarageConfig;
use crate::error::{NetError, SensorError};

// ───────────────────────────────────────────────────────────────
// Network link (station / soft-AP)
// ───────────────────────────────────────────────────────────────

/// Addressing of an established station link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkInfo {
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

pub trait ConnectivityPort {
    /// Validate and install station credentials.
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), NetError>;

    /// Advance association with the configured network by one step.
    ///
    /// Returns [`NetError::Connecting`] while the attempt is in flight and
    /// [`NetError::ConnectTimeout`] once the adapter's budget is spent.  A
    /// step never blocks for long, so it is safe to call from the poll loop.
    fn connect(&mut self) -> Result<LinkInfo, NetError>;

    /// Wait between steps of [`connect_blocking`](Self::connect_blocking).
    fn settle(&mut self) {}

    /// Step [`connect`](Self::connect) until it settles.  Startup only.
    fn connect_blocking(&mut self) -> Result<LinkInfo, NetError> {
        loop {
            match self.connect() {
                Err(NetError::Connecting) => self.settle(),
                done => return done,
            }
        }
    }

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Addressing of the current link, if up.
    fn link_info(&self) -> Option<LinkInfo>;

    /// Bring up an access point for onboarding.
    fn start_access_point(&mut self, ssid: &str) -> Result<(), NetError>;
}

// ───────────────────────────────────────────────────────────────
// UDP socket
// ───────────────────────────────────────────────────────────────

pub trait DatagramPort {
    /// Open the listening socket.  Failure here is fatal to the device.
    fn bind(&mut self, port: u16) -> Result<(), NetError>;

    fn close(&mut self);

    /// Non-blocking receive.  `Ok(None)` means nothing is waiting.
    fn recv_from(&mut self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddrV4)>, NetError>;

    fn send_to(&mut self, payload: &[u8], dest: SocketAddrV4) -> Result<(), NetError>;
}

// ───────────────────────────────────────────────────────────────
// Environment sensor
// ───────────────────────────────────────────────────────────────

/// One reading from the temperature / humidity / pressure sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub dewpoint_c: f32,
    /// Sea-level corrected, hPa.
    pub pressure_hpa: f32,
}

pub trait EnvironmentPort {
    fn read(&mut self) -> Result<EnvironmentReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Monotonic milliseconds since boot, wrapping.
    fn now_ms(&self) -> u32;

    /// Wall-clock seconds since the Unix epoch; 0 until synchronised.
    fn epoch_secs(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Status indicator
// ───────────────────────────────────────────────────────────────

pub type Rgb = (u8, u8, u8);

pub trait StatusIndicator {
    /// Show `colour`; flash with `flash_period` poll ticks, 0 for solid.
    fn set(&mut self, colour: Rgb, flash_period: u8);
}

// ───────────────────────────────────────────────────────────────
// Event sink
// ───────────────────────────────────────────────────────────────

/// Structured [`AppEvent`](super::events::AppEvent)s leave the core here.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`GarageConfig`].
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    /// `Err(NotFound)` when no usable record exists; the caller then
    /// starts onboarding.
    fn load(&self) -> Result<GarageConfig, ConfigError>;

    fn save(&self, config: &GarageConfig) -> Result<(), ConfigError>;

    /// Forget the stored record.
    fn clear(&self) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    NotFound,
    Corrupted,
    IoError,
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no stored configuration"),
            Self::Corrupted => write!(f, "stored configuration corrupted"),
            Self::IoError => write!(f, "storage I/O error"),
            Self::ValidationFailed(why) => write!(f, "validation failed: {why}"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(why) => Self::Config(why),
            ConfigError::NotFound => Self::Config("no stored configuration"),
            ConfigError::Corrupted => Self::Config("stored configuration corrupted"),
            ConfigError::IoError => Self::Config("storage I/O error"),
        }
    }
}
