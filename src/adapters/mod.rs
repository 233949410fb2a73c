//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements        | Connects to                   |
//! |---------------|-------------------|-------------------------------|
//! | `environment` | EnvironmentPort   | T/H/P sensor (absent or sim)  |
//! | `log_sink`    | EventSink         | Serial log output             |
//! | `nvs`         | ConfigPort        | NVS / in-memory store         |
//! | `time`        | ClockPort         | ESP32 system timer            |
//! | `udp_socket`  | DatagramPort      | lwIP / host UDP socket        |
//! | `wifi`        | ConnectivityPort  | ESP-IDF WiFi STA / soft-AP    |
//!
//! `device_id` is a helper rather than an adapter: it derives the default
//! hostname from the factory MAC.

pub mod device_id;
pub mod environment;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod udp_socket;
pub mod wifi;
