//! Unified error types for the garage door firmware.
//!
//! Each layer owns a small `Copy` error enum; every one of them converts
//! into [`Error`] so the poll loop handles failures uniformly.  Sensor noise
//! and relay writes never produce errors: the former is counted by the edge
//! detectors, the latter is fire-and-forget.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Network link or UDP socket failure.
    Net(NetError),
    /// Inbound datagram could not be decoded.
    Decode(DecodeError),
    /// Environment sensor could not be read.
    Sensor(SensorError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl Error {
    /// The device cannot continue without a restart.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Net(NetError::PortUnavailable))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Net(e) => write!(f, "net: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    /// Operation needs a link that is not up.
    NotConnected,
    /// Association is in flight; poll `connect` again.
    Connecting,
    /// Station did not associate within the connect budget.
    ConnectTimeout,
    /// The listening UDP port could not be allocated.
    PortUnavailable,
    /// A datagram could not be sent.
    SendFailed,
    /// The socket reported an error other than "no data".
    ReceiveFailed,
    /// Soft-AP for onboarding could not be started.
    AccessPointFailed,
    /// SSID or password rejected before any radio activity.
    InvalidCredentials,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::Connecting => write!(f, "connecting"),
            Self::ConnectTimeout => write!(f, "connect timed out"),
            Self::PortUnavailable => write!(f, "UDP port unavailable"),
            Self::SendFailed => write!(f, "send failed"),
            Self::ReceiveFailed => write!(f, "receive failed"),
            Self::AccessPointFailed => write!(f, "access point start failed"),
            Self::InvalidCredentials => write!(f, "invalid SSID or password"),
        }
    }
}

impl From<NetError> for Error {
    fn from(e: NetError) -> Self {
        Self::Net(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Missing or unknown `Vnnn` version tag.
    BadVersion,
    /// Version accepted but the command tag is unknown.
    BadRequest,
    /// Datagram exceeds the receive buffer.
    TooLong,
    /// Payload is not valid UTF-8.
    NotUtf8,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadVersion => write!(f, "bad protocol version"),
            Self::BadRequest => write!(f, "unrecognised request"),
            Self::TooLong => write!(f, "datagram too long"),
            Self::NotUtf8 => write!(f, "payload not UTF-8"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Environment sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Sensor did not answer on the bus.
    NotPresent,
    /// Bus transaction failed mid-read.
    ReadFailed,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPresent => write!(f, "sensor not present"),
            Self::ReadFailed => write!(f, "read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
