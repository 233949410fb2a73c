//! GarageDoor Firmware: main entry point
//!
//! Hexagonal architecture with an interrupt-fed poll loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiAdapter        UdpSocketAdapter   NvsAdapter   Esp32Time  │
//! │  (Connectivity)     (Datagram)         (Config)     (Clock)    │
//! │  StatusLed          LogEventSink       NoEnvironmentSensor     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌─────────────────────────┐   ┌──────────────────────────┐    │
//! │  │ UdpControlService       │──▶│ GarageApp                │    │
//! │  │ link FSM · decode · fan │   │ DoorController · reports │    │
//! │  └─────────────────────────┘   └──────────────────────────┘    │
//! │                                                                │
//! │  GPIO ISRs ──▶ EdgeDetectors ──▶ event queue ──▶ poll loop     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::EspSntp;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use garagedoor::adapters::device_id;
use garagedoor::adapters::environment::NoEnvironmentSensor;
use garagedoor::adapters::log_sink::LogEventSink;
use garagedoor::adapters::nvs::NvsAdapter;
use garagedoor::adapters::time::Esp32TimeAdapter;
use garagedoor::adapters::udp_socket::UdpSocketAdapter;
use garagedoor::adapters::wifi::WifiAdapter;
use garagedoor::app::events::AppEvent;
use garagedoor::app::indicator;
use garagedoor::app::ports::{ClockPort, ConfigPort, EventSink, StatusIndicator};
use garagedoor::app::service::GarageApp;
use garagedoor::config::GarageConfig;
use garagedoor::door::controller::{DoorController, DoorSensors};
use garagedoor::drivers::actuator_line::ActuatorLine;
use garagedoor::drivers::edge_detector::EdgeDetector;
use garagedoor::drivers::hw_init::{self, LineBinding};
use garagedoor::drivers::status_led::StatusLed;
use garagedoor::drivers::watchdog::{self, Watchdog};
use garagedoor::error::Error;
use garagedoor::events::{self, SensorLine};
use garagedoor::net::{ConnState, UdpControlService};
use garagedoor::pins;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Pause before restarting after a fatal network error, so the log drains.
const FATAL_COOLDOWN: Duration = Duration::from_secs(5);

// ── Helpers ───────────────────────────────────────────────────

/// Seed a detector from the live level, give it `'static` lifetime and
/// attach its GPIO interrupt.
fn monitor(line: SensorLine, detector: EdgeDetector, now_ms: u32) -> Result<&'static EdgeDetector> {
    let gpio = detector.line();
    let detector: &'static EdgeDetector =
        Box::leak(Box::new(detector.seeded(hw_init::gpio_read(gpio), now_ms)));
    let binding: &'static LineBinding = Box::leak(Box::new(LineBinding { gpio, line, detector }));
    hw_init::attach_line_isr(binding).map_err(Error::from)?;
    Ok(detector)
}

/// Log a poll-loop failure; a fatal one restarts the controller.
fn report(context: &str, e: Error) {
    if e.is_fatal() {
        error!("{}: {}, restarting in {}s", context, e, FATAL_COOLDOWN.as_secs());
        std::thread::sleep(FATAL_COOLDOWN);
        watchdog::restart();
    }
    warn!("{}: {}", context, e);
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  GarageDoor v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let watchdog = Watchdog::new();

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            None
        }
    };
    let mut config = match nvs.as_ref().map(ConfigPort::load) {
        Some(Ok(cfg)) => {
            info!("Config loaded from NVS");
            cfg
        }
        Some(Err(e)) => {
            warn!("NVS config load failed ({}), using defaults", e);
            GarageConfig::default()
        }
        None => GarageConfig::default(),
    };

    let mac = device_id::read_mac();
    if !config.valid {
        config.hostname = device_id::hostname(&mac);
    }
    info!("Hostname: {}", config.hostname);

    // ── 3. Initialise hardware peripherals ────────────────────
    hw_init::init_peripherals().map_err(Error::from)?;
    hw_init::init_isr_service().map_err(Error::from)?;

    let clock = Esp32TimeAdapter::new();
    let now = clock.now_ms();

    let open = monitor(
        SensorLine::Open,
        EdgeDetector::new(
            pins::DOOR_OPEN_SENSOR_GPIO,
            pins::SENSOR_ACTIVE_HIGH,
            config.debounce_ms,
            config.boundary_max_matched_ms,
        ),
        now,
    )?;
    let closed = monitor(
        SensorLine::Closed,
        EdgeDetector::new(
            pins::DOOR_CLOSED_SENSOR_GPIO,
            pins::SENSOR_ACTIVE_HIGH,
            config.debounce_ms,
            config.boundary_max_matched_ms,
        ),
        now,
    )?;
    let light = monitor(
        SensorLine::Light,
        EdgeDetector::new(
            pins::LIGHT_SENSOR_GPIO,
            pins::SENSOR_ACTIVE_HIGH,
            config.debounce_ms,
            config.light_max_matched_ms,
        ),
        now,
    )?;
    let switch = monitor(
        SensorLine::Switch,
        EdgeDetector::new(pins::MANUAL_SWITCH_GPIO, pins::SWITCH_ACTIVE_HIGH, config.debounce_ms, 0)
            .with_hooks(hw_init::switch_pressed_hook, hw_init::ignore_hook),
        now,
    )?;

    let relays = hw_init::relay_outputs()
        .map(|pin| ActuatorLine::new(pin, pin.0, pins::RELAY_ACTIVE_HIGH));
    let door = DoorController::new(
        DoorSensors { open, closed, light, switch },
        relays,
        config.relay_pulse_ms,
        config.switch_policy,
        now,
    );

    // ── 4. Network adapters ───────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs_partition))?,
        sysloop,
    )?;
    let mut net = UdpControlService::new(
        WifiAdapter::new(wifi, config.connect_timeout_ms),
        UdpSocketAdapter::new(),
    );

    // ── 5. Application core ───────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut led = StatusLed::new();
    let mut app = GarageApp::new(door, NoEnvironmentSensor::new(), clock, &config);
    app.start(&mut sink);

    if let Err(e) = net.begin(&config) {
        report("Network start", e);
    }
    let mut link_state = net.state();
    // Started on the first station link and kept for the device's lifetime.
    let mut sntp: Option<EspSntp<'static>> = None;

    info!("System ready. Entering poll loop.");

    // ── 6. Poll loop ──────────────────────────────────────────
    loop {
        events::drain_events(|event| app.handle_event(event, &mut sink));

        for line in app.tick(&mut sink) {
            if let Err(e) = net.send_all(&line) {
                report("Multicast", e);
            }
        }

        if let Err(e) = net.check_requests(&mut app) {
            report("Request", e);
        }
        if let Err(e) = net.poll_link() {
            report("Link", e);
        }

        if net.state() != link_state {
            sink.emit(&AppEvent::LinkChanged {
                from: link_state,
                to: net.state(),
            });
            link_state = net.state();
        }

        if sntp.is_none() && net.state() == ConnState::Connected {
            match EspSntp::new_default() {
                Ok(s) => {
                    info!("SNTP started");
                    sntp = Some(s);
                }
                Err(e) => warn!("SNTP start failed: {}", e),
            }
        }

        let (colour, period) = indicator::select(net.state(), Some(app.status().state));
        led.set(colour, period);
        led.refresh();

        if app.telemetry_due() {
            sink.emit(&AppEvent::Telemetry(app.build_telemetry(net.counters())));
            info!("Pins: {}", app.door().pin_states());
        }

        if app.take_restart() {
            info!("Restart requested over UDP");
            led.off();
            watchdog::restart();
        }

        watchdog.feed();
        std::thread::sleep(POLL_INTERVAL);
    }
}
