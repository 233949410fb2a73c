//! Door position tracking and relay sequencing.
//!
//! [`position::DoorPositionModel`] turns the two boundary sensors into a
//! canonical state; [`controller::DoorController`] owns the relays and the
//! manual-switch policy.

pub mod controller;
pub mod position;

use core::fmt;

/// Canonical door position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DoorState {
    Open = 0,
    Opening = 1,
    Closed = 2,
    Closing = 3,
    Stopped = 4,
    Unknown = 5,
    /// Both boundary sensors matched at once: wiring or sensor fault.
    Bad = 6,
}

impl DoorState {
    /// Name used in status lines and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Open => "Opened",
            Self::Opening => "Opening",
            Self::Closed => "Closed",
            Self::Closing => "Closing",
            Self::Stopped => "Stopped",
            Self::Unknown => "Unknown",
            Self::Bad => "Bad",
        }
    }

    pub const fn is_moving(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Last known direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Down = 1,
    None = 2,
}

impl Direction {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "Up",
            Self::Down => "Down",
            Self::None => "Stationary",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Actions the controller can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorRequest {
    OpenDoor,
    CloseDoor,
    StopDoor,
    LightOn,
    LightOff,
}
