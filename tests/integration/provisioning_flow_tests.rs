//! Integration tests for the onboarding flow.
//!
//! First boot finds no stored record and parks the service on an access
//! point.  Credentials are validated and persisted through the config
//! port, the service reconnects, and the next boot comes straight up.

use garagedoor::app::ports::{ConfigError, ConfigPort};
use garagedoor::config::{GarageConfig, SwitchPolicy};
use garagedoor::net::{ConnState, Reply, RequestHandler, RequestKind, UdpControlService};

use crate::mock_hw::{MemConfig, ScriptedLink, ScriptedSocket};

struct Silent;

impl RequestHandler for Silent {
    fn on_request(&mut self, _kind: RequestKind) -> Option<Reply> {
        None
    }
}

fn boot_config(store: &MemConfig) -> GarageConfig {
    store.load().unwrap_or_default()
}

#[test]
fn first_boot_provisions_then_reboot_connects() {
    let store = MemConfig::default();
    assert_eq!(store.load(), Err(ConfigError::NotFound));

    // First boot: nothing stored.
    let mut cfg = boot_config(&store);
    let mut net = UdpControlService::new(ScriptedLink::default(), ScriptedSocket::default());
    net.begin(&cfg).unwrap();
    assert_eq!(net.state(), ConnState::Provisioning);
    assert_eq!(net.link().access_point.as_deref(), Some("garagedoor"));

    // Credentials arrive and are persisted.
    cfg.set_credentials("garage-net", "hunter22").unwrap();
    store.save(&cfg).unwrap();
    net.provisioned(&cfg.ssid, &cfg.password).unwrap();
    net.check_requests(&mut Silent).unwrap();
    assert_eq!(net.state(), ConnState::Connected);

    // Second boot: stored record is used directly.
    let cfg = boot_config(&store);
    assert!(cfg.valid);
    assert_eq!(cfg.ssid.as_str(), "garage-net");
    let mut net = UdpControlService::new(ScriptedLink::default(), ScriptedSocket::default());
    net.begin(&cfg).unwrap();
    assert_eq!(net.state(), ConnState::Connected);
    assert_eq!(net.link().access_point, None);
}

#[test]
fn short_password_is_never_persisted() {
    let store = MemConfig::default();
    let mut cfg = GarageConfig::default();
    cfg.set_credentials("garage-net", "short").unwrap();
    assert!(matches!(store.save(&cfg), Err(ConfigError::ValidationFailed(_))));
    assert_eq!(store.load(), Err(ConfigError::NotFound));
}

#[test]
fn out_of_range_tuning_is_rejected_not_clamped() {
    let store = MemConfig::default();
    let mut cfg = GarageConfig::default();
    cfg.set_credentials("garage-net", "").unwrap();
    cfg.switch_policy = SwitchPolicy::DoublePress { window_ms: 50 };
    assert!(store.save(&cfg).is_err());

    cfg.switch_policy = SwitchPolicy::DoublePress { window_ms: 1_500 };
    store.save(&cfg).unwrap();
    assert_eq!(
        store.load().unwrap().switch_policy,
        SwitchPolicy::DoublePress { window_ms: 1_500 }
    );
}

#[test]
fn cleared_record_sends_next_boot_back_to_provisioning() {
    let store = MemConfig::default();
    let mut cfg = GarageConfig::default();
    cfg.set_credentials("garage-net", "hunter22").unwrap();
    store.save(&cfg).unwrap();

    store.clear().unwrap();
    let cfg = boot_config(&store);
    assert!(!cfg.valid);

    let mut net = UdpControlService::new(ScriptedLink::default(), ScriptedSocket::default());
    net.begin(&cfg).unwrap();
    assert_eq!(net.state(), ConnState::Provisioning);
}

#[test]
fn rejected_credentials_keep_the_access_point() {
    let mut net = UdpControlService::new(ScriptedLink::default(), ScriptedSocket::default());
    net.begin(&GarageConfig::default()).unwrap();
    assert!(net.provisioned("", "hunter22").is_err());
    assert_eq!(net.state(), ConnState::Provisioning);
}
