//! Integration tests for the application core: request replies, ISR event
//! handling, per-tick multicast lines and the boot-to-open scenario.

use garagedoor::app::events::AppEvent;
use garagedoor::app::ports::ClockPort;
use garagedoor::app::service::GarageApp;
use garagedoor::config::{GarageConfig, SwitchPolicy};
use garagedoor::door::controller::{DoorController, DoorSensors, Relay};
use garagedoor::door::{Direction, DoorState};
use garagedoor::drivers::edge_detector::EdgeDetector;
use garagedoor::drivers::hw_init::event_for;
use garagedoor::events::{drain_from, push_to, Event, EventQueue, SensorLine};
use garagedoor::net::{NetCounters, RequestHandler, RequestKind, UdpControlService};

use crate::mock_hw::{
    relay_bank, relay_levels, CollectingSink, FakeClock, FakeEnvironment, MockPin, PinLog,
    ScriptedLink, ScriptedSocket,
};

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
            open: EdgeDetector::new(4, true, 50, 0).seeded(open, 0),
            closed: EdgeDetector::new(5, true, 50, 0).seeded(closed, 0),
            light: EdgeDetector::new(6, true, 50, 0),
            switch: EdgeDetector::new(7, false, 50, 0).seeded(true, 0),
        }
    }
}

type App<'a> = GarageApp<'a, MockPin, FakeEnvironment, FakeClock>;

fn app_with<'a>(
    lines: &'a Lines,
    environment: FakeEnvironment,
    clock: &FakeClock,
) -> (App<'a>, PinLog) {
    app_configured(lines, environment, clock, &GarageConfig::default())
}

fn app_configured<'a>(
    lines: &'a Lines,
    environment: FakeEnvironment,
    clock: &FakeClock,
    config: &GarageConfig,
) -> (App<'a>, PinLog) {
    let (relays, log) = relay_bank();
    let sensors = DoorSensors {
        open: &lines.open,
        closed: &lines.closed,
        light: &lines.light,
        switch: &lines.switch,
    };
    let now = clock.now_ms();
    let door = DoorController::new(sensors, relays, PULSE, SwitchPolicy::SinglePress, now);
    (GarageApp::new(door, environment, clock.clone(), config), log)
}

fn app<'a>(lines: &'a Lines, clock: &FakeClock) -> (App<'a>, PinLog) {
    app_with(lines, FakeEnvironment::new(), clock)
}

// ── Replies ───────────────────────────────────────────────────

#[test]
fn door_query_reports_closed() {
    let lines = Lines::new(false, true);
    let clock = FakeClock::new(0);
    let (mut app, _) = app(&lines, &clock);

    let reply = app.on_request(RequestKind::DoorStatus).unwrap();
    assert_eq!(reply.as_str(), "S=Closed,L=Off,C=Y,O=N,M=N,A=1760000000\r");
}

#[test]
fn open_command_presses_the_open_relay_without_reply() {
    let lines = Lines::new(false, true);
    let clock = FakeClock::new(100);
    let (mut app, log) = app(&lines, &clock);

    assert_eq!(app.on_request(RequestKind::OpenDoor), None);
    assert!(app.door().is_relay_on(Relay::Open));
    assert_eq!(relay_levels(&log), [true, false, false, false]);

    clock.advance(PULSE);
    let mut sink = CollectingSink::default();
    app.tick(&mut sink);
    assert_eq!(relay_levels(&log), [false; 4]);
}

#[test]
fn action_replies_are_opt_in() {
    let lines = Lines::new(false, true);
    let clock = FakeClock::new(0);
    let config = GarageConfig {
        reply_to_actions: true,
        ..GarageConfig::default()
    };
    let (mut app, _) = app_configured(&lines, FakeEnvironment::new(), &clock, &config);

    let reply = app.on_request(RequestKind::LightOn).unwrap();
    assert!(reply.starts_with("S=Closed,"), "door has not moved yet: {reply}");
    assert!(app.door().is_relay_on(Relay::Light));
}

#[test]
fn restart_sets_flag_without_reply() {
    let lines = Lines::new(false, true);
    let clock = FakeClock::new(0);
    let (mut app, _) = app(&lines, &clock);

    assert_eq!(app.on_request(RequestKind::Restart), None);
    assert!(app.take_restart());
    assert!(!app.take_restart(), "flag is one-shot");
}

#[test]
fn environment_query_formats_reading() {
    let lines = Lines::new(false, true);
    let clock = FakeClock::new(0);
    let (mut app, _) = app(&lines, &clock);

    let reply = app.on_request(RequestKind::Environment).unwrap();
    assert_eq!(reply.as_str(), "T=18.25,H=61.50,D=10.73,P=1013.20,A=1760000000\r");
}

#[test]
fn environment_query_without_sensor_has_no_reply() {
    let lines = Lines::new(false, true);
    let clock = FakeClock::new(0);
    let (mut app, _) = app_with(&lines, FakeEnvironment::absent(), &clock);
    assert_eq!(app.on_request(RequestKind::Environment), None);
}

// ── Tick ──────────────────────────────────────────────────────

#[test]
fn boundary_edge_emits_change_and_one_door_line() {
    let lines = Lines::new(false, true);
    let clock = FakeClock::new(0);
    let (mut app, _) = app(&lines, &clock);
    let mut sink = CollectingSink::default();

    clock.set(1_000);
    lines.closed.on_transition(false, 1_000);
    app.handle_event(Event::BoundaryEdge(SensorLine::Closed), &mut sink);
    let out = app.tick(&mut sink);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].as_str(), "S=Opening,L=Off,C=N,O=N,M=Y,A=1760000000\r");
    assert_eq!(
        sink.events,
        [AppEvent::DoorChanged {
            from: DoorState::Closed,
            to: DoorState::Opening,
            direction: Direction::Up,
        }]
    );

    assert!(app.tick(&mut sink).is_empty(), "nothing new to report");
}

#[test]
fn light_change_is_reported() {
    let lines = Lines::new(false, true);
    let clock = FakeClock::new(0);
    let (mut app, _) = app(&lines, &clock);
    let mut sink = CollectingSink::default();

    lines.light.on_transition(true, 1_000);
    app.handle_event(Event::LightEdge, &mut sink);
    let out = app.tick(&mut sink);

    assert_eq!(sink.events, [AppEvent::LightChanged(true)]);
    assert!(out[0].starts_with("S=Closed,L=On,"));
}

#[test]
fn environment_line_follows_interval() {
    let lines = Lines::new(false, true);
    let clock = FakeClock::new(0);
    let (mut app, _) = app(&lines, &clock);
    let mut sink = CollectingSink::default();

    clock.set(29_999);
    assert!(app.tick(&mut sink).is_empty());

    clock.set(30_000);
    let out = app.tick(&mut sink);
    assert_eq!(out.len(), 1);
    assert!(out[0].starts_with("T=18.25,"));

    clock.set(45_000);
    assert!(app.tick(&mut sink).is_empty(), "re-armed from the last read");
}

#[test]
fn missing_sensor_skips_environment_line() {
    let lines = Lines::new(false, true);
    let clock = FakeClock::new(0);
    let (mut app, _) = app_with(&lines, FakeEnvironment::absent(), &clock);
    let mut sink = CollectingSink::default();
    clock.set(30_000);
    assert!(app.tick(&mut sink).is_empty());
}

#[test]
fn telemetry_is_due_once_per_interval() {
    let lines = Lines::new(false, true);
    let clock = FakeClock::new(0);
    let (mut app, _) = app(&lines, &clock);

    clock.set(29_000);
    assert!(!app.telemetry_due());
    clock.set(30_000);
    assert!(app.telemetry_due());
    assert!(!app.telemetry_due());

    let t = app.build_telemetry(NetCounters::default());
    assert_eq!(t.state, DoorState::Closed);
    assert_eq!(t.uptime_secs, 30);
}

// ── Switch ────────────────────────────────────────────────────

#[test]
fn ignored_switch_press_is_reported() {
    let lines = Lines::new(false, false);
    let clock = FakeClock::new(0);
    let (mut app, _) = app(&lines, &clock);
    let mut sink = CollectingSink::default();

    app.handle_event(Event::SwitchPressed, &mut sink);
    assert_eq!(sink.events, [AppEvent::SwitchIgnored(DoorState::Stopped)]);
    assert_eq!(app.door().active_relays(), 0);
}

// ── End to end ────────────────────────────────────────────────

#[test]
fn ambiguous_boot_settles_then_switch_opens() {
    let lines = Lines::new(false, false);
    let clock = FakeClock::new(0);
    let (mut app, log) = app(&lines, &clock);
    let mut sink = CollectingSink::default();
    let queue = EventQueue::new();

    app.start(&mut sink);
    assert_eq!(sink.events, [AppEvent::Started(DoorState::Stopped)]);

    // Closed sensor makes contact.
    clock.set(1_000);
    let t = lines.closed.on_transition(true, 1_000);
    if let Some(event) = event_for(SensorLine::Closed, t) {
        assert!(push_to(&queue, event));
    }
    drain_from(&queue, |event| app.handle_event(event, &mut sink));
    let out = app.tick(&mut sink);
    assert_eq!(app.status().state, DoorState::Closed);
    assert!(out[0].starts_with("S=Closed,"));

    // Manual switch (active low) pressed.
    clock.set(3_000);
    let t = lines.switch.on_transition(false, 3_000);
    assert_eq!(event_for(SensorLine::Switch, t), None);
    assert!(lines.switch.is_matched());
    assert!(push_to(&queue, Event::SwitchPressed));
    assert_eq!(drain_from(&queue, |event| app.handle_event(event, &mut sink)), 1);

    assert!(app.door().is_relay_on(Relay::Open));
    assert_eq!(app.door().active_relays(), 1);
    assert_eq!(app.door().pending_release(), Some(3_000 + PULSE));

    clock.set(3_000 + PULSE);
    app.tick(&mut sink);
    assert_eq!(relay_levels(&log), [false; 4]);
    assert!(!sink.events.iter().any(|e| matches!(e, AppEvent::SwitchIgnored(_))));
}

// ── Poll loop ─────────────────────────────────────────────────

type Net = UdpControlService<ScriptedLink, ScriptedSocket>;

/// One pass of the firmware poll loop, in its order.
fn poll_once(app: &mut App<'_>, net: &mut Net, queue: &EventQueue, sink: &mut CollectingSink) {
    drain_from(queue, |event| app.handle_event(event, sink));
    for line in app.tick(sink) {
        let _ = net.send_all(&line);
    }
    let _ = net.check_requests(app);
}

#[test]
fn stalled_reconnect_never_holds_a_relay_past_its_pulse() {
    let lines = Lines::new(false, true);
    let clock = FakeClock::new(1_000);
    let (mut app, log) = app(&lines, &clock);
    let mut sink = CollectingSink::default();
    let queue = EventQueue::new();

    // Station credentials known but the access point is gone, and every
    // connect step eats 20 s.
    let mut net = Net::new(ScriptedLink::default(), ScriptedSocket::default());
    net.provisioned("garage-net", "hunter22").unwrap();
    net.link_mut().reachable = false;
    net.link_mut().stall = Some((clock.clone(), 20_000));

    assert!(push_to(&queue, Event::SwitchPressed));
    poll_once(&mut app, &mut net, &queue, &mut sink);
    assert!(app.door().is_relay_on(Relay::Open));
    assert!(app.actuating());
    assert_eq!(net.link().connect_calls, 0, "no connect step under a held relay");
    assert_eq!(clock.now_ms(), 1_000);

    clock.advance(PULSE);
    poll_once(&mut app, &mut net, &queue, &mut sink);
    assert_eq!(relay_levels(&log), [false; 4]);
    assert!(!app.actuating());
    assert_eq!(net.link().connect_calls, 1);
    assert_eq!(net.counters().connect_timeouts, 1);
    assert_eq!(clock.now_ms(), 1_000 + PULSE + 20_000);
}
