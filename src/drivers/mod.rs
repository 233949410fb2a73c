//! Input/output drivers, hardware initialisation, and peripheral helpers.

pub mod actuator_line;
pub mod edge_detector;
pub mod hw_init;
pub mod led_patterns;
pub mod status_led;
pub mod watchdog;
