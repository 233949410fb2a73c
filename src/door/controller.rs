//! Door controller: relay sequencing and the manual-switch policy.
//!
//! The four relays are wired across the buttons of the opener's remote, so
//! every actuation is a momentary press: release all relays, assert one,
//! and arm a single release deadline that the poll loop checks through
//! [`DoorController::poll`].  Re-arming replaces the pending deadline.

use core::fmt::Write;

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use super::position::DoorPositionModel;
use super::{Direction, DoorRequest, DoorState};
use crate::config::SwitchPolicy;
use crate::drivers::actuator_line::ActuatorLine;
use crate::drivers::edge_detector::EdgeDetector;

/// Index into the relay bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Relay {
    Open = 0,
    Close = 1,
    Stop = 2,
    Light = 3,
}

impl Relay {
    pub const COUNT: usize = 4;

    fn for_request(request: DoorRequest) -> Self {
        match request {
            DoorRequest::OpenDoor => Self::Open,
            DoorRequest::CloseDoor => Self::Close,
            DoorRequest::StopDoor => Self::Stop,
            // The opener only has a light toggle.
            DoorRequest::LightOn | DoorRequest::LightOff => Self::Light,
        }
    }
}

/// The monitored lines the controller reads.  Detectors are shared with
/// the GPIO ISRs, hence borrowed.
#[derive(Clone, Copy)]
pub struct DoorSensors<'a> {
    pub open: &'a EdgeDetector,
    pub closed: &'a EdgeDetector,
    pub light: &'a EdgeDetector,
    pub switch: &'a EdgeDetector,
}

/// Operational counters, derived from the detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DoorCounters {
    pub opened: u32,
    pub opening: u32,
    pub closed: u32,
    pub closing: u32,
    pub light_on: u32,
    pub light_off: u32,
    pub switch_presses: u32,
}

pub struct DoorController<'a, P> {
    sensors: DoorSensors<'a>,
    model: DoorPositionModel,
    relays: [ActuatorLine<P>; Relay::COUNT],
    pulse_ms: u32,
    release_at: Option<u32>,
    policy: SwitchPolicy,
    last_press_ms: Option<u32>,
    awaiting_confirmation: bool,
    changed: bool,
}

impl<'a, P: OutputPin> DoorController<'a, P> {
    /// `relays` is indexed by [`Relay`].  All relays are released and the
    /// initial position is taken from the current sensor readings.
    pub fn new(
        sensors: DoorSensors<'a>,
        relays: [ActuatorLine<P>; Relay::COUNT],
        pulse_ms: u32,
        policy: SwitchPolicy,
        now_ms: u32,
    ) -> Self {
        let model =
            DoorPositionModel::new(sensors.open.current_reading(), sensors.closed.current_reading());
        let mut ctl = Self {
            sensors,
            model,
            relays,
            pulse_ms,
            release_at: None,
            policy,
            last_press_ms: None,
            awaiting_confirmation: false,
            changed: false,
        };
        ctl.release_all(now_ms);
        info!("Door: initial state {} ({:?} policy)", ctl.model.state(), policy);
        ctl
    }

    // ── Actuation ─────────────────────────────────────────────

    /// Press one button of the remote for the configured pulse time.
    pub fn request(&mut self, request: DoorRequest, now_ms: u32) {
        self.release_all(now_ms);
        self.relays[Relay::for_request(request) as usize].on(now_ms);
        self.release_at = Some(now_ms.wrapping_add(self.pulse_ms));
        info!("Door: {:?} (release in {} ms)", request, self.pulse_ms);
    }

    /// Release the relays once the pulse deadline has passed.  Returns
    /// `true` on the tick that released them.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        match self.release_at {
            Some(deadline) if deadline_passed(now_ms, deadline) => {
                self.release_all(now_ms);
                true
            }
            _ => false,
        }
    }

    fn release_all(&mut self, now_ms: u32) {
        for relay in &mut self.relays {
            relay.off(now_ms);
        }
        self.release_at = None;
    }

    // ── Events ────────────────────────────────────────────────

    /// Manual switch press, already debounced by the switch detector.
    /// Returns the request that was issued, if any.
    pub fn on_switch_pressed(&mut self, now_ms: u32) -> Option<DoorRequest> {
        if !self.press_confirmed(now_ms) {
            return None;
        }

        let request = match self.model.state() {
            DoorState::Closed => Some(DoorRequest::OpenDoor),
            DoorState::Open => Some(DoorRequest::CloseDoor),
            DoorState::Opening | DoorState::Closing => Some(DoorRequest::StopDoor),
            DoorState::Stopped => match self.model.direction() {
                Direction::Down => Some(DoorRequest::OpenDoor),
                Direction::Up => Some(DoorRequest::CloseDoor),
                Direction::None => None,
            },
            DoorState::Bad | DoorState::Unknown => None,
        };

        match request {
            Some(req) => {
                info!(
                    "Door: switch pressed while {} ({}), issuing {:?}",
                    self.model.state(),
                    self.model.direction(),
                    req
                );
                self.request(req, now_ms);
                if req == DoorRequest::StopDoor {
                    self.model.set_stopped();
                    self.changed = true;
                }
            }
            None => warn!(
                "Door: switch pressed while {} ({}), ignoring",
                self.model.state(),
                self.model.direction()
            ),
        }
        request
    }

    fn press_confirmed(&mut self, now_ms: u32) -> bool {
        let previous = self.last_press_ms.replace(now_ms);
        let SwitchPolicy::DoublePress { window_ms } = self.policy else {
            return true;
        };
        let within_window = previous.is_some_and(|t| now_ms.wrapping_sub(t) <= window_ms);
        if !within_window {
            self.awaiting_confirmation = true;
            info!("Door: switch armed, press again within {} ms", window_ms);
            return false;
        }
        core::mem::take(&mut self.awaiting_confirmation)
    }

    /// A boundary sensor changed: re-evaluate the position model.
    pub fn on_sensor_edge(&mut self) -> bool {
        let before = (self.model.state(), self.model.direction());
        let changed = self.model.update(
            self.sensors.open.current_reading(),
            self.sensors.closed.current_reading(),
        );
        if changed {
            info!(
                "Door: {} ({}) -> {} ({})",
                before.0,
                before.1,
                self.model.state(),
                self.model.direction()
            );
            self.changed = true;
        }
        changed
    }

    /// Read and clear the "state changed" notification flag.
    pub fn take_changed(&mut self) -> bool {
        core::mem::take(&mut self.changed)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> DoorState {
        self.model.state()
    }

    pub fn direction(&self) -> Direction {
        self.model.direction()
    }

    pub fn is_open(&self) -> bool {
        self.model.state() == DoorState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.model.state() == DoorState::Closed
    }

    pub fn is_moving(&self) -> bool {
        self.model.state().is_moving()
    }

    pub fn is_lit(&self) -> bool {
        self.sensors.light.is_matched()
    }

    pub fn is_relay_on(&self, relay: Relay) -> bool {
        self.relays[relay as usize].is_on()
    }

    pub fn active_relays(&self) -> usize {
        self.relays.iter().filter(|r| r.is_on()).count()
    }

    pub fn pending_release(&self) -> Option<u32> {
        self.release_at
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        self.awaiting_confirmation
    }

    pub fn sensors(&self) -> DoorSensors<'a> {
        self.sensors
    }

    pub fn counters(&self) -> DoorCounters {
        let s = &self.sensors;
        DoorCounters {
            opened: s.open.matched_count(),
            closing: s.open.unmatched_count(),
            closed: s.closed.matched_count(),
            opening: s.closed.unmatched_count(),
            light_on: s.light.matched_count(),
            light_off: s.light.unmatched_count(),
            switch_presses: s.switch.matched_count(),
        }
    }

    /// Debounced and raw level of each monitored line, for diagnostics.
    pub fn pin_states(&self) -> heapless::String<96> {
        fn on_off(v: bool) -> &'static str {
            if v { "On" } else { "Off" }
        }
        let s = &self.sensors;
        let mut out = heapless::String::new();
        let _ = write!(
            out,
            "Light: {} Open: {} Closed: {} Raw light: {} Raw open: {} Raw closed: {}",
            on_off(s.light.is_matched()),
            on_off(s.open.is_matched()),
            on_off(s.closed.is_matched()),
            on_off(s.light.current_reading()),
            on_off(s.open.current_reading()),
            on_off(s.closed.current_reading()),
        );
        out
    }
}

/// `now` is at or after `deadline`, tolerating timer wrap.
pub fn deadline_passed(now_ms: u32, deadline: u32) -> bool {
    now_ms.wrapping_sub(deadline) < u32::MAX / 2
}
