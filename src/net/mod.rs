//! UDP control plane: wire protocol, peer learning and the connection
//! state machine that ties them to the link and socket ports.

pub mod peers;
pub mod protocol;
pub mod service;

pub use peers::PeerRegistry;
pub use protocol::RequestKind;
pub use service::{ConnState, NetCounters, Reply, RequestHandler, UdpControlService};
