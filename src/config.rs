//! Persistent controller configuration.
//!
//! Network credentials, UDP ports, the altitude offset used by the
//! environment collaborator, and every timing constant of the door logic.
//! Stored as a postcard blob in NVS; see [`crate::adapters::nvs`].

use serde::{Deserialize, Serialize};

pub type Hostname = heapless::String<32>;
pub type Ssid = heapless::String<32>;
pub type Password = heapless::String<64>;

/// Inbound request port (`0xFEED`).
pub const DEFAULT_UDP_PORT: u16 = 0xFEED;
/// Outbound multicast status port (`0xCE5C`).
pub const DEFAULT_MULTICAST_PORT: u16 = 0xCE5C;

/// What a press of the wall switch has to look like before it acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SwitchPolicy {
    /// Every debounced press acts immediately.
    #[default]
    SinglePress,
    /// A press only acts if it follows another press within `window_ms`.
    DoublePress { window_ms: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarageConfig {
    /// Cleared by a factory reset; an invalid record sends the network
    /// service into provisioning.
    pub valid: bool,

    // --- Network ---
    pub hostname: Hostname,
    pub ssid: Ssid,
    pub password: Password,
    /// Port requests are received on (and replies sent back to).
    pub udp_port: u16,
    /// Port multicast status lines are sent to.
    pub multicast_port: u16,
    /// How long one station association may take before it is abandoned.
    pub connect_timeout_ms: u32,
    /// Answer M004-M008 with the door status line.  Off by default: door
    /// and light commands get no reply.
    pub reply_to_actions: bool,

    // --- Environment ---
    /// Site altitude in metres, for sea-level pressure correction.
    pub altitude_offset_m: f32,
    /// Period of the environment multicast (seconds).
    pub environment_interval_secs: u32,

    // --- Door timing ---
    pub debounce_ms: u32,
    /// Longest plausible matched interval of a boundary sensor (0 = unbounded).
    pub boundary_max_matched_ms: u32,
    /// Same for the light-status line.
    pub light_max_matched_ms: u32,
    /// How long a relay is held before all relays are released.
    pub relay_pulse_ms: u32,
    pub switch_policy: SwitchPolicy,

    // --- Diagnostics ---
    pub telemetry_interval_secs: u32,
}

impl Default for GarageConfig {
    fn default() -> Self {
        let mut hostname = Hostname::new();
        let _ = hostname.push_str("garagedoor");
        Self {
            valid: false,

            hostname,
            ssid: Ssid::new(),
            password: Password::new(),
            udp_port: DEFAULT_UDP_PORT,
            multicast_port: DEFAULT_MULTICAST_PORT,
            connect_timeout_ms: 10_000,
            reply_to_actions: false,

            altitude_offset_m: 131.0,
            environment_interval_secs: 30,

            debounce_ms: 50,
            boundary_max_matched_ms: 1_000,
            light_max_matched_ms: 0,
            relay_pulse_ms: 2_000,
            switch_policy: SwitchPolicy::SinglePress,

            telemetry_interval_secs: 30,
        }
    }
}

impl GarageConfig {
    /// Range-check every field that would brick the device if persisted.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.ssid.is_empty() || !self.ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return Err("ssid must be 1-32 printable ASCII bytes");
        }
        if !self.password.is_empty() && self.password.len() < 8 {
            return Err("password must be empty or 8-64 bytes");
        }
        if self.hostname.is_empty() {
            return Err("hostname must not be empty");
        }
        if self.udp_port == 0 || self.multicast_port == 0 {
            return Err("ports must be non-zero");
        }
        if !(1_000..=60_000).contains(&self.connect_timeout_ms) {
            return Err("connect_timeout_ms must be 1000-60000");
        }
        if !(-500.0..=9_000.0).contains(&self.altitude_offset_m) {
            return Err("altitude_offset_m must be -500-9000");
        }
        if !(5..=1_000).contains(&self.debounce_ms) {
            return Err("debounce_ms must be 5-1000");
        }
        if self.boundary_max_matched_ms != 0 && self.boundary_max_matched_ms <= self.debounce_ms {
            return Err("boundary_max_matched_ms must exceed debounce_ms");
        }
        if !(100..=10_000).contains(&self.relay_pulse_ms) {
            return Err("relay_pulse_ms must be 100-10000");
        }
        if let SwitchPolicy::DoublePress { window_ms } = self.switch_policy {
            if !(200..=10_000).contains(&window_ms) {
                return Err("double press window must be 200-10000 ms");
            }
        }
        if !(5..=3_600).contains(&self.environment_interval_secs) {
            return Err("environment_interval_secs must be 5-3600");
        }
        if !(5..=3_600).contains(&self.telemetry_interval_secs) {
            return Err("telemetry_interval_secs must be 5-3600");
        }
        Ok(())
    }

    /// Install station credentials and mark the record usable.
    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), &'static str> {
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| "ssid too long")?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| "password too long")?;
        self.valid = true;
        Ok(())
    }
}
