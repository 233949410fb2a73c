//! WiFi station / soft-AP adapter.
//!
//! Implements [`ConnectivityPort`], the hexagonal boundary for the network
//! link.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi` over
//!   `EspWifi`, constructed in `main` from the modem peripheral.
//! - **all other targets**: an in-memory simulation with a fixed lease.
//!
//! ## Connect policy
//!
//! `connect()` is a step, not a wait.  The first call starts an association
//! and later calls check on it, returning [`NetError::Connecting`] until the
//! station is up.  When `timeout_ms` passes without a lease the attempt is
//! dropped with [`NetError::ConnectTimeout`] and the next call starts over.

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::ports::{ConnectivityPort, LinkInfo};
use crate::config::{Password, Ssid};
use crate::error::NetError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration, Configuration,
    EspWifi,
};

/// Pause between steps while [`ConnectivityPort::connect_blocking`] waits.
#[cfg(target_os = "espidf")]
const SETTLE_MS: u64 = 100;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), NetError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(NetError::InvalidCredentials);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), NetError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(NetError::InvalidCredentials);
    }
    Ok(())
}

/// Dotted netmask for a CIDR prefix length.
pub fn prefix_to_netmask(prefix: u8) -> Ipv4Addr {
    let bits = match prefix {
        0 => 0,
        p if p >= 32 => u32::MAX,
        p => u32::MAX << (32 - u32::from(p)),
    };
    Ipv4Addr::from(bits)
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    ssid: Ssid,
    password: Password,
    timeout_ms: u32,
    /// When the association in flight was started.
    attempt_started: Option<u32>,
    link: Option<LinkInfo>,
    /// Simulation: whether the configured network answers.
    #[cfg(not(target_os = "espidf"))]
    sim_reachable: bool,
    /// Simulation: how long the access point takes to hand out a lease.
    #[cfg(not(target_os = "espidf"))]
    sim_association_ms: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_now_ms: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>, timeout_ms: u32) -> Self {
        Self {
            wifi,
            ssid: Ssid::new(),
            password: Password::new(),
            timeout_ms,
            attempt_started: None,
            link: None,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            ssid: Ssid::new(),
            password: Password::new(),
            timeout_ms,
            attempt_started: None,
            link: None,
            sim_reachable: true,
            sim_association_ms: 0,
            sim_now_ms: 0,
        }
    }

    /// Simulation: make the access point (un)reachable.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_reachable(&mut self, reachable: bool) {
        self.sim_reachable = reachable;
        if !reachable {
            self.link = None;
        }
    }

    /// Simulation: delay between starting an association and the lease.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_association_delay(&mut self, ms: u32) {
        self.sim_association_ms = ms;
    }

    /// Simulation: move the adapter's clock forward.
    #[cfg(not(target_os = "espidf"))]
    pub fn advance(&mut self, ms: u32) {
        self.sim_now_ms = self.sim_now_ms.wrapping_add(ms);
    }

    pub fn is_associating(&self) -> bool {
        self.attempt_started.is_some()
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_now_ms(&self) -> u32 {
        crate::adapters::time::isr_now_ms()
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_now_ms(&self) -> u32 {
        self.sim_now_ms
    }

    #[cfg(target_os = "espidf")]
    fn platform_begin_attempt(&mut self) -> Result<(), NetError> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPAWPA2Personal
        };
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: self.ssid.as_str().try_into().map_err(|_| NetError::InvalidCredentials)?,
                password: self
                    .password
                    .as_str()
                    .try_into()
                    .map_err(|_| NetError::InvalidCredentials)?,
                auth_method,
                ..Default::default()
            }))
            .map_err(|_| NetError::ConnectTimeout)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|_| NetError::ConnectTimeout)?;
        }
        // The driver's own connect only queues the association.
        self.wifi
            .wifi_mut()
            .connect()
            .map_err(|_| NetError::ConnectTimeout)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin_attempt(&mut self) -> Result<(), NetError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_poll_attempt(&mut self, _elapsed_ms: u32) -> Result<Option<LinkInfo>, NetError> {
        if !self.wifi.wifi().is_up().unwrap_or(false) {
            return Ok(None);
        }
        let ip_info = self
            .wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map_err(|_| NetError::ConnectTimeout)?;
        Ok(Some(LinkInfo {
            ip: ip_info.ip,
            netmask: prefix_to_netmask(ip_info.subnet.mask.0),
        }))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_poll_attempt(&mut self, elapsed_ms: u32) -> Result<Option<LinkInfo>, NetError> {
        if !self.sim_reachable || elapsed_ms < self.sim_association_ms {
            return Ok(None);
        }
        Ok(Some(LinkInfo {
            ip: Ipv4Addr::new(192, 168, 1, 50),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
        }))
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        let _ = self.wifi.wifi_mut().disconnect();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): disconnected");
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.link.is_some() && self.sim_reachable
    }

    #[cfg(target_os = "espidf")]
    fn platform_settle(&mut self) {
        crate::drivers::watchdog::feed_current_task();
        std::thread::sleep(std::time::Duration::from_millis(SETTLE_MS));
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_settle(&mut self) {
        self.advance(100);
    }

    #[cfg(target_os = "espidf")]
    fn platform_start_ap(&mut self, ssid: &str) -> Result<(), NetError> {
        let _ = self.wifi.stop();
        self.wifi
            .set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
                ssid: ssid.try_into().map_err(|_| NetError::AccessPointFailed)?,
                auth_method: AuthMethod::None,
                channel: 1,
                ..Default::default()
            }))
            .map_err(|_| NetError::AccessPointFailed)?;
        self.wifi.start().map_err(|_| NetError::AccessPointFailed)?;
        self.wifi
            .wait_netif_up()
            .map_err(|_| NetError::AccessPointFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start_ap(&mut self, ssid: &str) -> Result<(), NetError> {
        if ssid.is_empty() || ssid.len() > 32 {
            return Err(NetError::AccessPointFailed);
        }
        info!("WiFi(sim): access point '{}' up", ssid);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), NetError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| NetError::InvalidCredentials)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| NetError::InvalidCredentials)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    fn connect(&mut self) -> Result<LinkInfo, NetError> {
        if self.ssid.is_empty() {
            return Err(NetError::InvalidCredentials);
        }
        if let Some(link) = self.link.filter(|_| self.platform_is_connected()) {
            return Ok(link);
        }

        let now = self.platform_now_ms();
        let started = match self.attempt_started {
            Some(started) => started,
            None => {
                info!("WiFi: connecting to '{}'", self.ssid);
                self.platform_begin_attempt()?;
                self.attempt_started = Some(now);
                now
            }
        };
        let elapsed = now.wrapping_sub(started);

        if let Some(link) = self.platform_poll_attempt(elapsed)? {
            info!("WiFi: associated after {} ms", elapsed);
            self.attempt_started = None;
            self.link = Some(link);
            return Ok(link);
        }
        if elapsed >= self.timeout_ms {
            warn!("WiFi: no lease from '{}' within {} ms", self.ssid, self.timeout_ms);
            self.attempt_started = None;
            self.platform_disconnect();
            return Err(NetError::ConnectTimeout);
        }
        Err(NetError::Connecting)
    }

    fn settle(&mut self) {
        self.platform_settle();
    }

    fn disconnect(&mut self) {
        let associating = self.attempt_started.take().is_some();
        if self.link.take().is_some() || associating {
            self.platform_disconnect();
            info!("WiFi: disconnected");
        }
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn link_info(&self) -> Option<LinkInfo> {
        self.link.filter(|_| self.platform_is_connected())
    }

    fn start_access_point(&mut self, ssid: &str) -> Result<(), NetError> {
        self.link = None;
        self.attempt_started = None;
        self.platform_start_ap(ssid)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
