//! Multicast destination list learned from inbound requests.
//!
//! Bounded, insertion-ordered, no duplicates.  When full, the oldest entry
//! is dropped to make room.

use core::net::Ipv4Addr;

pub const DEFAULT_PEER_SLOTS: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct PeerRegistry<const N: usize = DEFAULT_PEER_SLOTS> {
    peers: heapless::Vec<Ipv4Addr, N>,
}

impl<const N: usize> PeerRegistry<N> {
    pub fn new() -> Self {
        Self {
            peers: heapless::Vec::new(),
        }
    }

    /// Remember `addr`.  Returns `true` if it was not already present.
    pub fn add(&mut self, addr: Ipv4Addr) -> bool {
        if N == 0 || self.contains(addr) {
            return false;
        }
        if self.peers.is_full() {
            self.peers.remove(0);
        }
        // Capacity was freed above.
        let _ = self.peers.push(addr);
        true
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.peers.contains(&addr)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.peers.iter().copied()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }
}

/// Directed broadcast address of the subnet `ip` sits on.
pub fn subnet_broadcast(ip: Ipv4Addr, netmask: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(ip) | !u32::from(netmask))
}
