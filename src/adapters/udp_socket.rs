//! Non-blocking UDP socket adapter.
//!
//! Implements [`DatagramPort`] over `std::net::UdpSocket`.  ESP-IDF maps
//! the std socket API onto lwIP, so the same code runs on target and on
//! the host.  Broadcast is enabled at bind time because status pushes go
//! to subnet broadcast addresses.

use core::net::SocketAddrV4;
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

use log::{info, warn};

use crate::app::ports::DatagramPort;
use crate::error::NetError;

#[derive(Default)]
pub struct UdpSocketAdapter {
    socket: Option<UdpSocket>,
}

impl UdpSocketAdapter {
    pub fn new() -> Self {
        Self { socket: None }
    }

    pub fn is_bound(&self) -> bool {
        self.socket.is_some()
    }

    /// Bound port, if any.  Useful after binding port 0 in tests.
    pub fn local_port(&self) -> Option<u16> {
        self.socket
            .as_ref()
            .and_then(|s| s.local_addr().ok())
            .map(|a| a.port())
    }
}

impl DatagramPort for UdpSocketAdapter {
    fn bind(&mut self, port: u16) -> Result<(), NetError> {
        self.close();
        let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], port))).map_err(|e| {
            warn!("UDP socket: bind to port {} failed: {}", port, e);
            NetError::PortUnavailable
        })?;
        socket
            .set_nonblocking(true)
            .map_err(|_| NetError::PortUnavailable)?;
        if let Err(e) = socket.set_broadcast(true) {
            warn!("UDP socket: broadcast not enabled: {}", e);
        }
        info!("UDP socket: bound to port {}", port);
        self.socket = Some(socket);
        Ok(())
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            info!("UDP socket: closed");
        }
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddrV4)>, NetError> {
        let socket = self.socket.as_ref().ok_or(NetError::NotConnected)?;
        match socket.recv_from(buf) {
            Ok((len, SocketAddr::V4(from))) => Ok(Some((len, from))),
            // IPv6 peers are not served.
            Ok((_, SocketAddr::V6(_))) => Ok(None),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => {
                warn!("UDP socket: receive error: {}", e);
                Err(NetError::ReceiveFailed)
            }
        }
    }

    fn send_to(&mut self, payload: &[u8], dest: SocketAddrV4) -> Result<(), NetError> {
        let socket = self.socket.as_ref().ok_or(NetError::NotConnected)?;
        match socket.send_to(payload, dest) {
            Ok(n) if n == payload.len() => Ok(()),
            Ok(n) => {
                warn!("UDP socket: short send to {} ({}/{})", dest, n, payload.len());
                Err(NetError::SendFailed)
            }
            Err(e) => {
                warn!("UDP socket: send to {} failed: {}", dest, e);
                Err(NetError::SendFailed)
            }
        }
    }
}
