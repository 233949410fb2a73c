//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | door={} ({}) light={} | up {}s | dropped_events={}",
                    t.state,
                    t.direction,
                    if t.lit { "On" } else { "Off" },
                    t.uptime_secs,
                    t.dropped_events,
                );
                info!(
                    "TELEM | opened={} opening={} closed={} closing={} light_on={} light_off={} presses={}",
                    t.door.opened,
                    t.door.opening,
                    t.door.closed,
                    t.door.closing,
                    t.door.light_on,
                    t.door.light_off,
                    t.door.switch_presses,
                );
                info!("TELEM | open sensor   {}", t.open_sensor);
                info!("TELEM | closed sensor {}", t.closed_sensor);
                info!("TELEM | light sensor  {}", t.light_sensor);
                info!("TELEM | switch        {}", t.switch);
                info!("TELEM | net {}", t.net);
            }
            AppEvent::DoorChanged {
                from,
                to,
                direction,
            } => {
                info!("DOOR  | {} -> {} ({})", from, to, direction);
            }
            AppEvent::LightChanged(lit) => {
                info!("LIGHT | {}", if *lit { "On" } else { "Off" });
            }
            AppEvent::SwitchIgnored(state) => {
                warn!("SWITCH| press ignored while {}", state);
            }
            AppEvent::LinkChanged { from, to } => {
                info!("LINK  | {} -> {}", from, to);
            }
            AppEvent::Started(state) => {
                info!("START | door={}", state);
            }
        }
    }
}
