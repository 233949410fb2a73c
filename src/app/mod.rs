//! Application core: door orchestration and protocol replies, zero I/O.
//!
//! All interaction with hardware and the network happens through the
//! **port traits** in [`ports`], keeping this layer testable without real
//! peripherals.

pub mod events;
pub mod indicator;
pub mod ports;
pub mod reports;
pub mod service;
