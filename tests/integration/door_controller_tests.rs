//! Integration tests for the sensor → position model → relay pipeline.
//!
//! Detectors are driven the way the GPIO ISRs drive them; relay writes are
//! read back from the mock pin log.

use garagedoor::config::SwitchPolicy;
use garagedoor::door::controller::{DoorController, DoorSensors, Relay};
use garagedoor::door::{Direction, DoorRequest, DoorState};
use garagedoor::drivers::edge_detector::EdgeDetector;

use crate::mock_hw::{relay_bank, relay_levels, MockPin, PinLog};

const DEBOUNCE: u32 = 50;
const PULSE: u32 = 2_000;

struct Lines {
    open: EdgeDetector,
    closed: EdgeDetector,
    light: EdgeDetector,
    switch: EdgeDetector,
}

impl Lines {
    fn new(open: bool, closed: bool) -> Self {
        Self {
            open: EdgeDetector::new(4, true, DEBOUNCE, 0).seeded(open, 0),
            closed: EdgeDetector::new(5, true, DEBOUNCE, 0).seeded(closed, 0),
            light: EdgeDetector::new(6, true, DEBOUNCE, 0),
            switch: EdgeDetector::new(7, false, DEBOUNCE, 0),
        }
    }

    fn sensors(&self) -> DoorSensors<'_> {
        DoorSensors {
            open: &self.open,
            closed: &self.closed,
            light: &self.light,
            switch: &self.switch,
        }
    }
}

fn controller<'a>(lines: &'a Lines, policy: SwitchPolicy) -> (DoorController<'a, MockPin>, PinLog) {
    let (relays, log) = relay_bank();
    (DoorController::new(lines.sensors(), relays, PULSE, policy, 0), log)
}

// ── Boot position ─────────────────────────────────────────────

#[test]
fn ambiguous_boot_is_stopped_then_settles_closed() {
    let lines = Lines::new(false, false);
    let (mut door, _) = controller(&lines, SwitchPolicy::SinglePress);
    assert_eq!(door.state(), DoorState::Stopped);

    lines.closed.on_transition(true, 1_000);
    assert!(door.on_sensor_edge());
    assert_eq!(door.state(), DoorState::Closed);
    assert_eq!(door.direction(), Direction::None);
    assert!(door.take_changed());
    assert!(!door.take_changed(), "changed flag is one-shot");
}

#[test]
fn boot_releases_every_relay() {
    let lines = Lines::new(false, true);
    let (door, log) = controller(&lines, SwitchPolicy::SinglePress);
    assert_eq!(door.active_relays(), 0);
    assert_eq!(relay_levels(&log), [false; 4]);
}

// ── Full travel cycle ─────────────────────────────────────────

#[test]
fn open_cycle_tracks_direction_and_counters() {
    let lines = Lines::new(false, true);
    let (mut door, _) = controller(&lines, SwitchPolicy::SinglePress);

    lines.closed.on_transition(false, 1_000);
    door.on_sensor_edge();
    assert_eq!((door.state(), door.direction()), (DoorState::Opening, Direction::Up));
    assert!(door.is_moving());

    lines.open.on_transition(true, 12_000);
    door.on_sensor_edge();
    assert_eq!((door.state(), door.direction()), (DoorState::Open, Direction::None));
    assert!(door.is_open());

    let c = door.counters();
    assert_eq!((c.opening, c.opened), (1, 1));
    assert_eq!((c.closing, c.closed), (0, 0));
}

#[test]
fn both_sensors_is_bad_then_unknown() {
    let lines = Lines::new(false, true);
    let (mut door, _) = controller(&lines, SwitchPolicy::SinglePress);

    lines.open.on_transition(true, 1_000);
    door.on_sensor_edge();
    assert_eq!(door.state(), DoorState::Bad);

    lines.open.on_transition(false, 2_000);
    lines.closed.on_transition(false, 2_000);
    door.on_sensor_edge();
    assert_eq!(door.state(), DoorState::Unknown);
}

// ── Relay sequencing ──────────────────────────────────────────

#[test]
fn request_asserts_exactly_one_relay_until_released() {
    let lines = Lines::new(false, true);
    let (mut door, log) = controller(&lines, SwitchPolicy::SinglePress);

    door.request(DoorRequest::OpenDoor, 100);
    assert_eq!(door.active_relays(), 1);
    assert!(door.is_relay_on(Relay::Open));
    assert_eq!(door.pending_release(), Some(100 + PULSE));

    assert!(!door.poll(100 + PULSE - 1));
    assert_eq!(door.active_relays(), 1);
    assert!(door.poll(100 + PULSE));
    assert_eq!(door.active_relays(), 0);
    assert_eq!(door.pending_release(), None);
    assert_eq!(relay_levels(&log), [false; 4]);
}

#[test]
fn new_request_releases_before_asserting() {
    let lines = Lines::new(false, true);
    let (mut door, log) = controller(&lines, SwitchPolicy::SinglePress);

    door.request(DoorRequest::OpenDoor, 100);
    log.borrow_mut().clear();
    door.request(DoorRequest::StopDoor, 600);

    let writes = log.borrow().clone();
    let (last, releases) = writes.split_last().unwrap();
    assert_eq!(*last, (Relay::Stop as usize, true));
    assert_eq!(releases.len(), 4);
    assert!(releases.iter().all(|&(_, high)| !high));
    assert_eq!(door.active_relays(), 1);
    assert_eq!(door.pending_release(), Some(600 + PULSE), "deadline re-armed, not stacked");
}

#[test]
fn light_requests_share_the_toggle_relay() {
    let lines = Lines::new(false, true);
    let (mut door, _) = controller(&lines, SwitchPolicy::SinglePress);
    door.request(DoorRequest::LightOn, 0);
    assert!(door.is_relay_on(Relay::Light));
    door.request(DoorRequest::LightOff, 10);
    assert!(door.is_relay_on(Relay::Light));
    assert_eq!(door.active_relays(), 1);
}

#[test]
fn release_deadline_survives_timer_wrap() {
    let lines = Lines::new(false, true);
    let (mut door, _) = controller(&lines, SwitchPolicy::SinglePress);
    let start = u32::MAX - 500;
    door.request(DoorRequest::CloseDoor, start);
    assert!(!door.poll(u32::MAX));
    assert!(door.poll(start.wrapping_add(PULSE)));
}

// ── Manual switch policy ──────────────────────────────────────

#[test]
fn switch_from_closed_opens_and_arms_one_timer() {
    let lines = Lines::new(false, true);
    let (mut door, _) = controller(&lines, SwitchPolicy::SinglePress);
    assert_eq!(door.on_switch_pressed(500), Some(DoorRequest::OpenDoor));
    assert_eq!(door.active_relays(), 1);
    assert_eq!(door.pending_release(), Some(500 + PULSE));
}

#[test]
fn switch_while_moving_stops_and_reverses_next() {
    let lines = Lines::new(true, false);
    let (mut door, _) = controller(&lines, SwitchPolicy::SinglePress);

    lines.open.on_transition(false, 1_000);
    door.on_sensor_edge();
    assert_eq!(door.state(), DoorState::Closing);

    assert_eq!(door.on_switch_pressed(2_000), Some(DoorRequest::StopDoor));
    assert_eq!((door.state(), door.direction()), (DoorState::Stopped, Direction::Down));

    assert_eq!(door.on_switch_pressed(6_000), Some(DoorRequest::OpenDoor));
}

#[test]
fn switch_from_stopped_without_direction_is_refused() {
    let lines = Lines::new(false, false);
    let (mut door, _) = controller(&lines, SwitchPolicy::SinglePress);
    assert_eq!(door.on_switch_pressed(100), None);
    assert_eq!(door.active_relays(), 0);
}

#[test]
fn switch_while_bad_is_refused() {
    let lines = Lines::new(true, true);
    let (mut door, _) = controller(&lines, SwitchPolicy::SinglePress);
    lines.open.on_transition(false, 100);
    lines.open.on_transition(true, 200);
    door.on_sensor_edge();
    assert_eq!(door.state(), DoorState::Bad);
    assert_eq!(door.on_switch_pressed(300), None);
}

#[test]
fn double_press_policy_needs_confirmation() {
    let lines = Lines::new(false, true);
    let policy = SwitchPolicy::DoublePress { window_ms: 2_000 };
    let (mut door, _) = controller(&lines, policy);

    assert_eq!(door.on_switch_pressed(1_000), None);
    assert!(door.is_awaiting_confirmation());
    assert_eq!(door.on_switch_pressed(2_500), Some(DoorRequest::OpenDoor));
    assert!(!door.is_awaiting_confirmation());
}

#[test]
fn double_press_window_expires() {
    let lines = Lines::new(false, true);
    let policy = SwitchPolicy::DoublePress { window_ms: 2_000 };
    let (mut door, _) = controller(&lines, policy);

    assert_eq!(door.on_switch_pressed(1_000), None);
    assert_eq!(door.on_switch_pressed(5_000), None, "too late: re-arms instead");
    assert!(door.is_awaiting_confirmation());
    assert_eq!(door.on_switch_pressed(5_400), Some(DoorRequest::OpenDoor));
}

// ── Diagnostics ───────────────────────────────────────────────

#[test]
fn light_follows_debounced_line() {
    let lines = Lines::new(false, true);
    let (door, _) = controller(&lines, SwitchPolicy::SinglePress);
    assert!(!door.is_lit());
    lines.light.on_transition(true, 1_000);
    assert!(door.is_lit());
    lines.light.on_transition(false, 1_010);
    assert!(door.is_lit(), "bounce must not turn the light off");
}

#[test]
fn pin_states_report_raw_and_debounced() {
    let lines = Lines::new(false, true);
    let (door, _) = controller(&lines, SwitchPolicy::SinglePress);
    let s = door.pin_states();
    assert!(s.contains("Closed: On"), "{s}");
    assert!(s.contains("Raw open: Off"), "{s}");
}
