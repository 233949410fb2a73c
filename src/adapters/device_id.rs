//! Device identity derived from the ESP32 factory MAC address.
//!
//! The default hostname is `garagedoor-xxyyzz` (last 3 MAC bytes, lower
//! hex).  It names the station on DHCP and the onboarding access point.

use core::fmt::Write;

use crate::config::Hostname;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

pub fn hostname(mac: &MacAddress) -> Hostname {
    let mut name = Hostname::new();
    let _ = write!(name, "garagedoor-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}
