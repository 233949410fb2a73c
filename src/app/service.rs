//! Application service: the garage-door core behind the UDP protocol.
//!
//! [`GarageApp`] owns the [`DoorController`] and the environment and clock
//! ports.  It answers decoded requests through [`RequestHandler`], reacts
//! to ISR events drained by the poll loop, and hands back the status lines
//! that should be multicast.
//!
//! ```text
//!  ISR queue ──▶ ┌──────────────────────┐ ──▶ EventSink
//!                │      GarageApp       │
//! UDP request ──▶│ DoorController · env │──▶ reply / multicast lines
//!                └──────────────────────┘
//! ```

use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use crate::config::GarageConfig;
use crate::door::controller::{deadline_passed, DoorController};
use crate::door::{DoorRequest, DoorState};
use crate::events::{dropped_events, Event};
use crate::net::protocol::RequestKind;
use crate::net::service::{NetCounters, Reply, RequestHandler};

use super::events::{AppEvent, TelemetryData};
use super::ports::{ClockPort, EnvironmentPort, EventSink};
use super::reports::{door_line, environment_line, DoorStatus};

/// Multicast lines produced by one tick: at most a door line and an
/// environment line.
pub type Outgoing = heapless::Vec<Reply, 2>;

// ───────────────────────────────────────────────────────────────
// GarageApp
// ───────────────────────────────────────────────────────────────

pub struct GarageApp<'a, P, E, K> {
    door: DoorController<'a, P>,
    environment: E,
    clock: K,
    environment_interval_ms: u32,
    next_environment_ms: u32,
    telemetry_interval_ms: u32,
    next_telemetry_ms: u32,
    last_state: DoorState,
    last_lit: bool,
    reply_to_actions: bool,
    restart_requested: bool,
}

impl<'a, P, E, K> GarageApp<'a, P, E, K>
where
    P: OutputPin,
    E: EnvironmentPort,
    K: ClockPort,
{
    pub fn new(door: DoorController<'a, P>, environment: E, clock: K, config: &GarageConfig) -> Self {
        let now = clock.now_ms();
        let environment_interval_ms = config.environment_interval_secs.saturating_mul(1_000);
        let telemetry_interval_ms = config.telemetry_interval_secs.saturating_mul(1_000);
        let last_state = door.state();
        let last_lit = door.is_lit();
        Self {
            door,
            environment,
            clock,
            environment_interval_ms,
            next_environment_ms: now.wrapping_add(environment_interval_ms),
            telemetry_interval_ms,
            next_telemetry_ms: now.wrapping_add(telemetry_interval_ms),
            last_state,
            last_lit,
            reply_to_actions: config.reply_to_actions,
            restart_requested: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started(self.door.state()));
        info!("App: started, door {}", self.door.state());
    }

    /// An M002 request was received since the last call.
    pub fn take_restart(&mut self) -> bool {
        core::mem::take(&mut self.restart_requested)
    }

    // ── Events ────────────────────────────────────────────────

    /// React to one event drained from the ISR queue.
    pub fn handle_event(&mut self, event: Event, sink: &mut impl EventSink) {
        let now = self.clock.now_ms();
        match event {
            Event::SwitchPressed => {
                if self.door.on_switch_pressed(now).is_none()
                    && !self.door.is_awaiting_confirmation()
                {
                    sink.emit(&AppEvent::SwitchIgnored(self.door.state()));
                }
            }
            Event::BoundaryEdge(line) => {
                debug!("Door: boundary edge on {:?}", line);
                self.door.on_sensor_edge();
            }
            Event::LightEdge => debug!("Door: light line now {}", self.door.is_lit()),
            Event::Spurious(line) => debug!("Door: spurious transition on {:?}", line),
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Release expired relay pulses, re-evaluate the door, and collect the
    /// lines to multicast.
    pub fn tick(&mut self, sink: &mut impl EventSink) -> Outgoing {
        let now = self.clock.now_ms();
        let mut out = Outgoing::new();

        if self.door.poll(now) {
            debug!("Door: relays released");
        }
        // Catches boundary edges lost to a full event queue.
        self.door.on_sensor_edge();

        let state = self.door.state();
        let lit = self.door.is_lit();
        let moved = self.door.take_changed() || state != self.last_state;
        let light_changed = lit != self.last_lit;
        if state != self.last_state {
            sink.emit(&AppEvent::DoorChanged {
                from: self.last_state,
                to: state,
                direction: self.door.direction(),
            });
            self.last_state = state;
        }
        if light_changed {
            sink.emit(&AppEvent::LightChanged(lit));
            self.last_lit = lit;
        }
        if moved || light_changed {
            let _ = out.push(self.door_line());
        }

        if deadline_passed(now, self.next_environment_ms) {
            self.next_environment_ms = now.wrapping_add(self.environment_interval_ms);
            if let Some(line) = self.read_environment() {
                let _ = out.push(line);
            }
        }
        out
    }

    /// Whether the telemetry interval has elapsed; re-arms when it has.
    pub fn telemetry_due(&mut self) -> bool {
        let now = self.clock.now_ms();
        if !deadline_passed(now, self.next_telemetry_ms) {
            return false;
        }
        self.next_telemetry_ms = now.wrapping_add(self.telemetry_interval_ms);
        true
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> DoorStatus {
        DoorStatus {
            state: self.door.state(),
            lit: self.door.is_lit(),
        }
    }

    pub fn door(&self) -> &DoorController<'a, P> {
        &self.door
    }

    pub fn door_mut(&mut self) -> &mut DoorController<'a, P> {
        &mut self.door
    }

    pub fn build_telemetry(&self, net: NetCounters) -> TelemetryData {
        let sensors = self.door.sensors();
        TelemetryData {
            state: self.door.state(),
            direction: self.door.direction(),
            lit: self.door.is_lit(),
            door: self.door.counters(),
            open_sensor: sensors.open.stats(),
            closed_sensor: sensors.closed.stats(),
            light_sensor: sensors.light.stats(),
            switch: sensors.switch.stats(),
            net,
            dropped_events: dropped_events(),
            uptime_secs: self.clock.now_ms() / 1_000,
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn door_line(&self) -> Reply {
        door_line(self.status(), self.clock.epoch_secs())
    }

    fn read_environment(&mut self) -> Option<Reply> {
        match self.environment.read() {
            Ok(reading) => Some(environment_line(&reading, self.clock.epoch_secs())),
            Err(e) => {
                warn!("Env: read failed: {}", e);
                None
            }
        }
    }
}

impl<P, E, K> RequestHandler for GarageApp<'_, P, E, K>
where
    P: OutputPin,
    E: EnvironmentPort,
    K: ClockPort,
{
    fn on_request(&mut self, kind: RequestKind) -> Option<Reply> {
        let request = match kind {
            RequestKind::Environment => return self.read_environment(),
            RequestKind::DoorStatus => return Some(self.door_line()),
            RequestKind::Restart => {
                info!("App: restart requested");
                self.restart_requested = true;
                return None;
            }
            RequestKind::OpenDoor => DoorRequest::OpenDoor,
            RequestKind::CloseDoor => DoorRequest::CloseDoor,
            RequestKind::StopDoor => DoorRequest::StopDoor,
            RequestKind::LightOn => DoorRequest::LightOn,
            RequestKind::LightOff => DoorRequest::LightOff,
        };
        self.door.request(request, self.clock.now_ms());
        self.reply_to_actions.then(|| self.door_line())
    }

    fn actuating(&self) -> bool {
        self.door.pending_release().is_some()
    }
}
