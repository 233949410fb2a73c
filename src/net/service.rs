//! UDP control service: link lifecycle, request decode and status fan-out.
//!
//! Dispatch is a table of plain function pointers indexed by
//! `[ConnState][NetEvent]`:
//!
//! ```text
//!               MadeConn      LostConn     SendReply   GetRequest   SendMulticast
//! Unconnected   now_connected do_nothing   connect     connect      connect
//! Connected     do_nothing    lost_link    send_reply  get_request  send_multicast
//! Provisioning  do_nothing    do_nothing   do_nothing  do_nothing   do_nothing
//! ```
//!
//! Handlers are the only place `state` changes.  Every network call is
//! non-blocking: `connect` advances the link adapter's association by one
//! step, so a dead access point leaves the service `Unconnected` for the
//! adapter's budget and the poll loop keeps running meanwhile.

use core::fmt;
use core::net::{Ipv4Addr, SocketAddrV4};

use log::{debug, info, warn};

use super::peers::{subnet_broadcast, PeerRegistry};
use super::protocol::{decode_datagram, RequestKind, MAX_DATAGRAM_LEN};
use crate::app::ports::{ConnectivityPort, DatagramPort, LinkInfo};
use crate::config::GarageConfig;
use crate::error::{DecodeError, Error, NetError, Result};

/// Text sent back to a requester or fanned out to peers.
pub type Reply = heapless::String<MAX_DATAGRAM_LEN>;

/// Callback invoked once per recognised request.  Returns the reply text,
/// or `None` when the request has no reply.
pub trait RequestHandler {
    fn on_request(&mut self, kind: RequestKind) -> Option<Reply>;

    /// An output pulse is in flight.  Connect steps wait until it ends.
    fn actuating(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// States and events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnState {
    Unconnected = 0,
    Connected = 1,
    Provisioning = 2,
}

impl ConnState {
    pub const COUNT: usize = 3;

    pub fn name(self) -> &'static str {
        match self {
            Self::Unconnected => "Unconnected",
            Self::Connected => "Connected",
            Self::Provisioning => "Provisioning",
        }
    }
}

impl fmt::Display for ConnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NetEvent {
    MadeConnection = 0,
    LostConnection = 1,
    SendReply = 2,
    GetRequest = 3,
    SendMulticast = 4,
}

impl NetEvent {
    pub const COUNT: usize = 5;
}

/// Connection and traffic counters, single-writer (the poll loop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetCounters {
    pub connects: u32,
    pub connect_timeouts: u32,
    pub requests: u32,
    pub bad_requests: u32,
    pub bad_versions: u32,
    pub replies: u32,
    pub multicasts: u32,
}

impl fmt::Display for NetCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "connects={} timeouts={} requests={} bad_req={} bad_ver={} replies={} multicasts={}",
            self.connects,
            self.connect_timeouts,
            self.requests,
            self.bad_requests,
            self.bad_versions,
            self.replies,
            self.multicasts
        )
    }
}

type Handler<C, D> = fn(&mut UdpControlService<C, D>) -> Result<()>;

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct UdpControlService<C, D> {
    link: C,
    socket: D,
    state: ConnState,
    counters: NetCounters,
    peers: PeerRegistry,
    udp_port: u16,
    multicast_port: u16,
    link_info: Option<LinkInfo>,
    last_sender: Option<SocketAddrV4>,
    /// One byte of headroom so an oversized datagram is seen as such.
    rx_buf: [u8; MAX_DATAGRAM_LEN + 1],
    rx_len: usize,
    tx: Reply,
}

impl<C: ConnectivityPort, D: DatagramPort> UdpControlService<C, D> {
    const STATE_TABLE: [[Handler<C, D>; NetEvent::COUNT]; ConnState::COUNT] = [
        // Unconnected
        [
            Self::now_connected,
            Self::do_nothing,
            Self::connect,
            Self::connect,
            Self::connect,
        ],
        // Connected
        [
            Self::do_nothing,
            Self::lost_link,
            Self::send_reply,
            Self::get_request,
            Self::send_multicast,
        ],
        // Provisioning
        [
            Self::do_nothing,
            Self::do_nothing,
            Self::do_nothing,
            Self::do_nothing,
            Self::do_nothing,
        ],
    ];

    pub fn new(link: C, socket: D) -> Self {
        Self {
            link,
            socket,
            state: ConnState::Unconnected,
            counters: NetCounters::default(),
            peers: PeerRegistry::new(),
            udp_port: crate::config::DEFAULT_UDP_PORT,
            multicast_port: crate::config::DEFAULT_MULTICAST_PORT,
            link_info: None,
            last_sender: None,
            rx_buf: [0; MAX_DATAGRAM_LEN + 1],
            rx_len: 0,
            tx: Reply::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring the service up from the stored configuration.
    ///
    /// Without a valid record, or when the first connect fails, the service
    /// parks in `Provisioning` with an access point named after the host.
    /// Only a port allocation failure is returned as an error.
    pub fn begin(&mut self, config: &GarageConfig) -> Result<()> {
        self.udp_port = config.udp_port;
        self.multicast_port = config.multicast_port;

        if !config.valid {
            info!("UDP: no stored credentials");
            return self.enter_provisioning(&config.hostname);
        }
        if let Err(e) = self.link.set_credentials(&config.ssid, &config.password) {
            warn!("UDP: stored credentials rejected: {}", e);
            return self.enter_provisioning(&config.hostname);
        }
        let first = self.link.connect_blocking();
        match self.finish_connect(first) {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("UDP: startup connect failed: {}", e);
                self.enter_provisioning(&config.hostname)
            }
        }
    }

    /// Drop the station link and serve an access point for onboarding.
    pub fn enter_provisioning(&mut self, ap_ssid: &str) -> Result<()> {
        self.socket.close();
        self.link.disconnect();
        self.link_info = None;
        self.set_state(ConnState::Provisioning);
        self.link.start_access_point(ap_ssid)?;
        info!("UDP: access point '{}' up", ap_ssid);
        Ok(())
    }

    /// New credentials were persisted; leave provisioning and connect on
    /// the next poll.
    pub fn provisioned(&mut self, ssid: &str, password: &str) -> Result<()> {
        self.link.set_credentials(ssid, password)?;
        self.link.disconnect();
        self.set_state(ConnState::Unconnected);
        Ok(())
    }

    // ── Poll-loop entry points ────────────────────────────────

    /// Poll for one inbound request and answer it.
    ///
    /// While unconnected this takes one connect step instead, unless the
    /// handler is [`actuating`](RequestHandler::actuating).  Malformed
    /// datagrams are counted and dropped; the returned kind is the request
    /// that was handled, if any.
    pub fn check_requests(
        &mut self,
        handler: &mut impl RequestHandler,
    ) -> Result<Option<RequestKind>> {
        self.rx_len = 0;
        if self.state == ConnState::Unconnected && handler.actuating() {
            return Ok(None);
        }
        self.dispatch(NetEvent::GetRequest)?;
        if self.rx_len == 0 {
            return Ok(None);
        }

        let kind = match decode_datagram(&self.rx_buf[..self.rx_len]) {
            Ok(kind) => kind,
            Err(DecodeError::BadVersion) => {
                self.counters.bad_versions += 1;
                warn!("UDP: bad protocol version from {:?}", self.last_sender);
                return Ok(None);
            }
            Err(e) => {
                self.counters.bad_requests += 1;
                warn!("UDP: {} from {:?}", e, self.last_sender);
                return Ok(None);
            }
        };

        debug!("UDP: {:?} from {:?}", kind, self.last_sender);
        if let Some(reply) = handler.on_request(kind) {
            self.tx = reply;
            self.dispatch(NetEvent::SendReply)?;
        }
        Ok(Some(kind))
    }

    /// Send `msg` to every learned peer on the multicast port.
    pub fn send_all(&mut self, msg: &str) -> Result<()> {
        self.tx.clear();
        if self.tx.push_str(msg).is_err() {
            warn!("UDP: multicast of {} bytes exceeds a datagram", msg.len());
            return Err(DecodeError::TooLong.into());
        }
        self.dispatch(NetEvent::SendMulticast)
    }

    /// The link adapter reported the station came up.
    pub fn link_up(&mut self) -> Result<()> {
        self.dispatch(NetEvent::MadeConnection)
    }

    /// The link adapter reported the station dropped.
    pub fn link_lost(&mut self) -> Result<()> {
        self.dispatch(NetEvent::LostConnection)
    }

    /// Demote when the link went away underneath a connected service.
    pub fn poll_link(&mut self) -> Result<()> {
        if self.state == ConnState::Connected && !self.link.is_connected() {
            warn!("UDP: link lost");
            return self.link_lost();
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ConnState {
        self.state
    }

    pub fn counters(&self) -> NetCounters {
        self.counters
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn last_sender(&self) -> Option<SocketAddrV4> {
        self.last_sender
    }

    pub fn local_ip(&self) -> Option<Ipv4Addr> {
        self.link_info.map(|l| l.ip)
    }

    pub fn link(&self) -> &C {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut C {
        &mut self.link
    }

    pub fn socket(&self) -> &D {
        &self.socket
    }

    pub fn socket_mut(&mut self) -> &mut D {
        &mut self.socket
    }

    // ── Dispatch ──────────────────────────────────────────────

    fn dispatch(&mut self, event: NetEvent) -> Result<()> {
        let handler = Self::STATE_TABLE[self.state as usize][event as usize];
        handler(self)
    }

    fn set_state(&mut self, next: ConnState) {
        if next != self.state {
            info!("UDP: {} -> {}", self.state, next);
            self.state = next;
        }
    }

    fn demote(&mut self) {
        self.socket.close();
        self.link_info = None;
        self.set_state(ConnState::Unconnected);
    }

    // ── Handlers ──────────────────────────────────────────────

    fn do_nothing(&mut self) -> Result<()> {
        Ok(())
    }

    fn connect(&mut self) -> Result<()> {
        let step = self.link.connect();
        self.finish_connect(step)
    }

    fn finish_connect(&mut self, step: core::result::Result<LinkInfo, NetError>) -> Result<()> {
        match step {
            Ok(info) => {
                self.counters.connects += 1;
                self.open_socket(info)
            }
            Err(NetError::Connecting) => {
                debug!("UDP: association in progress");
                Ok(())
            }
            Err(e) => {
                self.counters.connect_timeouts += 1;
                warn!("UDP: connect failed ({}), attempt {}", e, self.counters.connect_timeouts);
                Err(NetError::ConnectTimeout.into())
            }
        }
    }

    fn now_connected(&mut self) -> Result<()> {
        let info = self.link.link_info().ok_or(NetError::NotConnected)?;
        self.counters.connects += 1;
        self.open_socket(info)
    }

    fn open_socket(&mut self, info: LinkInfo) -> Result<()> {
        if self.socket.bind(self.udp_port).is_err() {
            return Err(NetError::PortUnavailable.into());
        }
        self.link_info = Some(info);
        info!(
            "UDP: listening on {}:{} (mask {})",
            info.ip, self.udp_port, info.netmask
        );
        self.set_state(ConnState::Connected);
        Ok(())
    }

    fn lost_link(&mut self) -> Result<()> {
        self.link.disconnect();
        self.demote();
        Ok(())
    }

    fn get_request(&mut self) -> Result<()> {
        match self.socket.recv_from(&mut self.rx_buf) {
            Ok(Some((len, from))) => {
                self.rx_len = len.min(self.rx_buf.len());
                self.counters.requests += 1;
                self.last_sender = Some(from);
                if let Some(info) = self.link_info {
                    let broadcast = subnet_broadcast(*from.ip(), info.netmask);
                    if self.peers.add(broadcast) {
                        info!("UDP: learned peer subnet {}", broadcast);
                    }
                }
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                self.demote();
                Err(e.into())
            }
        }
    }

    fn send_reply(&mut self) -> Result<()> {
        let Some(dest) = self.last_sender else {
            return Ok(());
        };
        if let Err(e) = self.socket.send_to(self.tx.as_bytes(), dest) {
            warn!("UDP: reply to {} failed", dest);
            self.demote();
            return Err(e.into());
        }
        self.counters.replies += 1;
        Ok(())
    }

    fn send_multicast(&mut self) -> Result<()> {
        if self.tx.is_empty() {
            info!("UDP: empty multicast skipped");
            return Ok(());
        }
        let mut failed = None;
        for peer in self.peers.iter() {
            let dest = SocketAddrV4::new(peer, self.multicast_port);
            if let Err(e) = self.socket.send_to(self.tx.as_bytes(), dest) {
                warn!("UDP: multicast to {} failed", dest);
                failed = Some(e);
                break;
            }
            self.counters.multicasts += 1;
        }
        match failed {
            Some(e) => {
                self.demote();
                Err(Error::Net(e))
            }
            None => Ok(()),
        }
    }
}
