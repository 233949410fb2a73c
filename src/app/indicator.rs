//! Status colour selection.
//!
//! A link that is not up owns the LED; once connected the door position
//! shows, and the dark-green "connected" colour is only visible until the
//! first door pattern is selected.

use super::ports::Rgb;
use crate::door::DoorState;
use crate::net::service::ConnState;

pub const GREEN: Rgb = (0, 255, 0);
pub const RED: Rgb = (255, 0, 0);
pub const MAGENTA: Rgb = (255, 0, 255);
pub const WHITE: Rgb = (255, 255, 255);
pub const YELLOW: Rgb = (255, 255, 0);
pub const DARK_GREEN: Rgb = (0, 64, 0);
pub const DARK_RED: Rgb = (64, 0, 0);
pub const DARK_MAGENTA: Rgb = (64, 0, 64);

/// Flash period (poll ticks) for anything in motion or in doubt.
pub const MOVING_FLASH: u8 = 10;
pub const SOLID: u8 = 0;

/// `(colour, flash period)` pair handed to a `StatusIndicator`.
pub type Pattern = (Rgb, u8);

/// Opening/Closing flash the colour of the end they are heading to.
pub fn door_pattern(state: DoorState) -> Pattern {
    match state {
        DoorState::Closed => (GREEN, SOLID),
        DoorState::Closing => (GREEN, MOVING_FLASH),
        DoorState::Open => (RED, SOLID),
        DoorState::Opening => (RED, MOVING_FLASH),
        DoorState::Stopped => (MAGENTA, SOLID),
        DoorState::Unknown => (WHITE, MOVING_FLASH),
        DoorState::Bad => (YELLOW, MOVING_FLASH),
    }
}

pub fn link_pattern(state: ConnState) -> Pattern {
    match state {
        ConnState::Connected => (DARK_GREEN, SOLID),
        ConnState::Unconnected => (DARK_RED, MOVING_FLASH),
        ConnState::Provisioning => (DARK_MAGENTA, SOLID),
    }
}

pub fn select(link: ConnState, door: Option<DoorState>) -> Pattern {
    match (link, door) {
        (ConnState::Connected, Some(state)) => door_pattern(state),
        _ => link_pattern(link),
    }
}
