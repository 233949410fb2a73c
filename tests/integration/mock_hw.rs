//! Mock hardware and network adapters for integration tests.
//!
//! Records every relay write, every datagram sent and every application
//! event so tests can assert on full histories without touching GPIO or
//! sockets.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};
use garagedoor::app::events::AppEvent;
use garagedoor::app::ports::{
    ClockPort, ConfigError, ConfigPort, ConnectivityPort, DatagramPort, EnvironmentPort,
    EnvironmentReading, EventSink, LinkInfo,
};
use garagedoor::config::GarageConfig;
use garagedoor::drivers::actuator_line::ActuatorLine;
use garagedoor::error::{NetError, SensorError};

// ── Relay pins ────────────────────────────────────────────────

/// Shared write log: `(relay index, level)` in write order.
pub type PinLog = Rc<RefCell<Vec<(usize, bool)>>>;

pub struct MockPin {
    index: usize,
    log: PinLog,
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push((self.index, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push((self.index, true));
        Ok(())
    }
}

/// Four active-high relay lines writing into one shared log.
pub fn relay_bank() -> ([ActuatorLine<MockPin>; 4], PinLog) {
    let log = PinLog::default();
    let bank = core::array::from_fn(|index| {
        let pin = MockPin {
            index,
            log: log.clone(),
        };
        ActuatorLine::new(pin, 15 + index as i32, true)
    });
    (bank, log)
}

/// Last written level of each relay, from the log alone.
#[allow(dead_code)]
pub fn relay_levels(log: &PinLog) -> [bool; 4] {
    let mut levels = [false; 4];
    for &(i, high) in log.borrow().iter() {
        levels[i] = high;
    }
    levels
}

// ── Clock ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FakeClock {
    now: Rc<Cell<u32>>,
    pub epoch: u64,
}

#[allow(dead_code)]
impl FakeClock {
    pub fn new(start_ms: u32) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
            epoch: 1_760_000_000,
        }
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl ClockPort for FakeClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }

    fn epoch_secs(&self) -> u64 {
        self.epoch
    }
}

// ── Environment ───────────────────────────────────────────────

pub struct FakeEnvironment {
    pub reading: Option<EnvironmentReading>,
    pub reads: u32,
}

#[allow(dead_code)]
impl FakeEnvironment {
    pub fn new() -> Self {
        Self {
            reading: Some(EnvironmentReading {
                temperature_c: 18.25,
                humidity_pct: 61.5,
                dewpoint_c: 10.73,
                pressure_hpa: 1013.2,
            }),
            reads: 0,
        }
    }

    pub fn absent() -> Self {
        Self {
            reading: None,
            reads: 0,
        }
    }
}

impl EnvironmentPort for FakeEnvironment {
    fn read(&mut self) -> Result<EnvironmentReading, SensorError> {
        self.reads += 1;
        self.reading.ok_or(SensorError::NotPresent)
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct CollectingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for CollectingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Config store ──────────────────────────────────────────────

#[derive(Default)]
pub struct MemConfig {
    pub record: RefCell<Option<GarageConfig>>,
}

impl ConfigPort for MemConfig {
    fn load(&self) -> Result<GarageConfig, ConfigError> {
        match self.record.borrow().as_ref() {
            Some(cfg) if cfg.valid => Ok(cfg.clone()),
            _ => Err(ConfigError::NotFound),
        }
    }

    fn save(&self, config: &GarageConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        *self.record.borrow_mut() = Some(config.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ConfigError> {
        *self.record.borrow_mut() = None;
        Ok(())
    }
}

// ── Scripted network ──────────────────────────────────────────

pub const STATION_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);

pub struct ScriptedLink {
    pub reachable: bool,
    pub up: bool,
    pub ssid: Option<String>,
    pub access_point: Option<String>,
    pub connect_calls: u32,
    /// Steps answered with `Connecting` before the outcome.
    pub pending: u32,
    /// Each connect step moves this clock forward, like a radio that
    /// holds the caller while it associates.
    pub stall: Option<(FakeClock, u32)>,
}

impl Default for ScriptedLink {
    fn default() -> Self {
        Self {
            reachable: true,
            up: false,
            ssid: None,
            access_point: None,
            connect_calls: 0,
            pending: 0,
            stall: None,
        }
    }
}

impl ConnectivityPort for ScriptedLink {
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), NetError> {
        if ssid.is_empty() || (!password.is_empty() && password.len() < 8) {
            return Err(NetError::InvalidCredentials);
        }
        self.ssid = Some(ssid.to_owned());
        Ok(())
    }

    fn connect(&mut self) -> Result<LinkInfo, NetError> {
        self.connect_calls += 1;
        if let Some((clock, ms)) = &self.stall {
            clock.advance(*ms);
        }
        if self.pending > 0 {
            self.pending -= 1;
            return Err(NetError::Connecting);
        }
        if self.ssid.is_none() || !self.reachable {
            return Err(NetError::ConnectTimeout);
        }
        self.up = true;
        self.access_point = None;
        Ok(LinkInfo {
            ip: STATION_IP,
            netmask: Ipv4Addr::new(255, 255, 255, 0),
        })
    }

    fn disconnect(&mut self) {
        self.up = false;
    }

    fn is_connected(&self) -> bool {
        self.up
    }

    fn link_info(&self) -> Option<LinkInfo> {
        self.up.then_some(LinkInfo {
            ip: STATION_IP,
            netmask: Ipv4Addr::new(255, 255, 255, 0),
        })
    }

    fn start_access_point(&mut self, ssid: &str) -> Result<(), NetError> {
        self.up = false;
        self.access_point = Some(ssid.to_owned());
        Ok(())
    }
}

#[derive(Default)]
pub struct ScriptedSocket {
    pub bound: Option<u16>,
    pub inbox: VecDeque<(Vec<u8>, SocketAddrV4)>,
    pub sent: Vec<(String, SocketAddrV4)>,
    pub refuse_bind: bool,
    pub fail_sends: bool,
}

#[allow(dead_code)]
impl ScriptedSocket {
    pub fn deliver(&mut self, text: &str, from: SocketAddrV4) {
        self.inbox.push_back((text.as_bytes().to_vec(), from));
    }

    pub fn take_sent(&mut self) -> Vec<(String, SocketAddrV4)> {
        std::mem::take(&mut self.sent)
    }
}

impl DatagramPort for ScriptedSocket {
    fn bind(&mut self, port: u16) -> Result<(), NetError> {
        if self.refuse_bind {
            return Err(NetError::PortUnavailable);
        }
        self.bound = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        self.bound = None;
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddrV4)>, NetError> {
        if self.bound.is_none() {
            return Err(NetError::NotConnected);
        }
        let Some((bytes, from)) = self.inbox.pop_front() else {
            return Ok(None);
        };
        let len = bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&bytes[..len]);
        Ok(Some((len, from)))
    }

    fn send_to(&mut self, payload: &[u8], dest: SocketAddrV4) -> Result<(), NetError> {
        if self.bound.is_none() {
            return Err(NetError::NotConnected);
        }
        if self.fail_sends {
            return Err(NetError::SendFailed);
        }
        self.sent
            .push((String::from_utf8_lossy(payload).into_owned(), dest));
        Ok(())
    }
}

/// A config record that passes validation.
#[allow(dead_code)]
pub fn provisioned_config() -> GarageConfig {
    let mut cfg = GarageConfig::default();
    cfg.set_credentials("garage-net", "hunter22").unwrap();
    cfg
}
