//! GPIO / peripheral pin assignments for the garage controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Monitored inputs (reed switches / opto-isolated contacts)
// ---------------------------------------------------------------------------

/// Fully-open boundary reed switch. HIGH = magnet present.
pub const DOOR_OPEN_SENSOR_GPIO: i32 = 4;
/// Fully-closed boundary reed switch. HIGH = magnet present.
pub const DOOR_CLOSED_SENSOR_GPIO: i32 = 5;
/// Opto-isolated feed from the opener's light circuit. HIGH = lamp lit.
pub const LIGHT_SENSOR_GPIO: i32 = 6;
/// Wall-mounted manual push switch.
pub const MANUAL_SWITCH_GPIO: i32 = 7;

/// All monitored boundary/status inputs share this polarity.
pub const SENSOR_ACTIVE_HIGH: bool = true;
/// Manual switch pulls the line low when pressed.
pub const SWITCH_ACTIVE_HIGH: bool = false;

// ---------------------------------------------------------------------------
// Relay outputs (momentary contacts wired across the opener's remote)
// ---------------------------------------------------------------------------

pub const OPEN_RELAY_GPIO: i32 = 15;
pub const CLOSE_RELAY_GPIO: i32 = 16;
pub const STOP_RELAY_GPIO: i32 = 17;
pub const LIGHT_RELAY_GPIO: i32 = 18;

/// Relay driver board energises the coil on a HIGH level.
pub const RELAY_ACTIVE_HIGH: bool = true;

// ---------------------------------------------------------------------------
// Status LED (common-cathode RGB via LEDC)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 38;
pub const LED_G_GPIO: i32 = 39;
pub const LED_B_GPIO: i32 = 40;
pub const LED_PWM_FREQ_HZ: u32 = 1_000;
