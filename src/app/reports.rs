//! Reply and multicast line builders.
//!
//! ```text
//! S=Closed,L=Off,C=Y,O=N,M=N,A=1760000000\r
//! T=18.25,H=61.50,D=10.73,P=1013.20,A=1760000000\r
//! ```

use core::fmt::Write;

use super::ports::EnvironmentReading;
use crate::door::DoorState;
use crate::net::service::Reply;

/// Snapshot of everything the door status line reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorStatus {
    pub state: DoorState,
    pub lit: bool,
}

impl DoorStatus {
    pub fn is_closed(&self) -> bool {
        self.state == DoorState::Closed
    }

    pub fn is_open(&self) -> bool {
        self.state == DoorState::Open
    }
}

fn yes_no(v: bool) -> &'static str {
    if v { "Y" } else { "N" }
}

pub fn door_line(status: DoorStatus, epoch_secs: u64) -> Reply {
    let mut out = Reply::new();
    // Bounded well under a datagram; cannot overflow.
    let _ = write!(
        out,
        "S={},L={},C={},O={},M={},A={}\r",
        status.state.name(),
        if status.lit { "On" } else { "Off" },
        yes_no(status.is_closed()),
        yes_no(status.is_open()),
        yes_no(status.state.is_moving()),
        epoch_secs
    );
    out
}

pub fn environment_line(reading: &EnvironmentReading, epoch_secs: u64) -> Reply {
    let mut out = Reply::new();
    let _ = write!(
        out,
        "T={:.2},H={:.2},D={:.2},P={:.2},A={}\r",
        reading.temperature_c,
        reading.humidity_pct,
        reading.dewpoint_c,
        reading.pressure_hpa,
        epoch_secs
    );
    out
}
