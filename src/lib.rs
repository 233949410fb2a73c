//! GarageDoor controller firmware library.
//!
//! Exposes the door, protocol and network logic for integration testing.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; on the host every adapter runs a simulation.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod door;
pub mod error;
pub mod events;
pub mod net;
pub mod pins;

pub mod adapters;
pub mod drivers;
