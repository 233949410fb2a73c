//! Door position from the two boundary sensors.
//!
//! A pure function of the current readings plus the previous state; the
//! model never looks at the clock.
//!
//! | open | closed | prior                                | next             |
//! |------|--------|--------------------------------------|------------------|
//! | 1    | 0      | any                                  | Open / None      |
//! | 0    | 1      | any                                  | Closed / None    |
//! | 1    | 1      | any                                  | Bad / None       |
//! | 0    | 0      | Open                                 | Closing / Down   |
//! | 0    | 0      | Closed                               | Opening / Up     |
//! | 0    | 0      | Bad                                  | Unknown / None   |
//! | 0    | 0      | Stopped, Opening, Closing, Unknown   | unchanged        |

use super::{Direction, DoorState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorPositionModel {
    state: DoorState,
    direction: Direction,
}

impl DoorPositionModel {
    /// Initial position from the boot-time readings.  Both sensors in the
    /// same state is ambiguous and reported as `Stopped`.
    pub fn new(open_matched: bool, closed_matched: bool) -> Self {
        let state = match (open_matched, closed_matched) {
            (true, false) => DoorState::Open,
            (false, true) => DoorState::Closed,
            _ => DoorState::Stopped,
        };
        Self {
            state,
            direction: Direction::None,
        }
    }

    /// Re-evaluate from fresh readings.  Returns `true` if either the state
    /// or the direction changed.
    pub fn update(&mut self, open_matched: bool, closed_matched: bool) -> bool {
        let (state, direction) = match (open_matched, closed_matched, self.state) {
            (true, false, _) => (DoorState::Open, Direction::None),
            (false, true, _) => (DoorState::Closed, Direction::None),
            (true, true, _) => (DoorState::Bad, Direction::None),
            (false, false, DoorState::Open) => (DoorState::Closing, Direction::Down),
            (false, false, DoorState::Closed) => (DoorState::Opening, Direction::Up),
            (false, false, DoorState::Bad) => (DoorState::Unknown, Direction::None),
            (false, false, _) => (self.state, self.direction),
        };
        let changed = state != self.state || direction != self.direction;
        self.state = state;
        self.direction = direction;
        changed
    }

    /// Mid-travel stop.  No sensor reports this, so the controller sets it.
    /// The direction is kept so the next switch press can reverse.
    pub fn set_stopped(&mut self) {
        self.state = DoorState::Stopped;
    }

    pub fn state(&self) -> DoorState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}
