//! Outbound application events.
//!
//! [`GarageApp`](super::service::GarageApp) and the poll loop emit these
//! through the [`EventSink`](super::ports::EventSink) port.  The production
//! sink renders them through `log`; tests collect them.

use crate::door::controller::DoorCounters;
use crate::door::{Direction, DoorState};
use crate::drivers::edge_detector::EdgeStats;
use crate::net::service::{ConnState, NetCounters};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller is up (carries the boot-time door position).
    Started(DoorState),

    /// Door position or travel direction changed.
    DoorChanged {
        from: DoorState,
        to: DoorState,
        direction: Direction,
    },

    /// Light-status line changed.
    LightChanged(bool),

    /// A switch press produced no door action.
    SwitchIgnored(DoorState),

    /// The UDP service moved between connection states.
    LinkChanged { from: ConnState, to: ConnState },

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time snapshot for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub state: DoorState,
    pub direction: Direction,
    pub lit: bool,
    pub door: DoorCounters,
    pub open_sensor: EdgeStats,
    pub closed_sensor: EdgeStats,
    pub light_sensor: EdgeStats,
    pub switch: EdgeStats,
    pub net: NetCounters,
    pub dropped_events: u32,
    pub uptime_secs: u32,
}
