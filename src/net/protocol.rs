//! Versioned text request protocol.
//!
//! ```text
//! V001:M003
//! ^^^^ ^^^^
//!  |  | `-- command tag (exact prefix match)
//!  |  `---- one-byte separator
//!  `------- protocol version
//! ```
//!
//! Anything after the tag is ignored, so `V001:M003\r\n` is a door query.

use crate::error::DecodeError;

pub const VERSION_TAG: &str = "V001";
/// Version tag plus the separator byte.
const HEADER_LEN: usize = VERSION_TAG.len() + 1;
/// Largest datagram accepted, inclusive.  Longer payloads are dropped.
pub const MAX_DATAGRAM_LEN: usize = 255;

/// Every request the protocol can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `M001`: temperature / humidity / pressure reading.
    Environment,
    /// `M002`: reboot the controller.
    Restart,
    /// `M003`: door status line.
    DoorStatus,
    /// `M004`
    OpenDoor,
    /// `M005`
    CloseDoor,
    /// `M006`
    StopDoor,
    /// `M007`
    LightOn,
    /// `M008`
    LightOff,
}

const COMMANDS: [(&str, RequestKind); 8] = [
    ("M001", RequestKind::Environment),
    ("M002", RequestKind::Restart),
    ("M003", RequestKind::DoorStatus),
    ("M004", RequestKind::OpenDoor),
    ("M005", RequestKind::CloseDoor),
    ("M006", RequestKind::StopDoor),
    ("M007", RequestKind::LightOn),
    ("M008", RequestKind::LightOff),
];

impl RequestKind {
    pub fn tag(self) -> &'static str {
        COMMANDS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("M000", |(tag, _)| tag)
    }
}

/// Decode one text request.
pub fn decode(text: &str) -> Result<RequestKind, DecodeError> {
    if !text.starts_with(VERSION_TAG) {
        return Err(DecodeError::BadVersion);
    }
    let payload = text.get(HEADER_LEN..).ok_or(DecodeError::BadRequest)?;
    COMMANDS
        .iter()
        .find(|(tag, _)| payload.starts_with(tag))
        .map(|(_, kind)| *kind)
        .ok_or(DecodeError::BadRequest)
}

/// Decode a raw datagram, checking size and encoding first.
pub fn decode_datagram(bytes: &[u8]) -> Result<RequestKind, DecodeError> {
    if bytes.len() > MAX_DATAGRAM_LEN {
        return Err(DecodeError::TooLong);
    }
    let text = core::str::from_utf8(bytes).map_err(|_| DecodeError::NotUtf8)?;
    decode(text)
}

/// Build the request text for `kind`, as a client would send it.
pub fn encode(kind: RequestKind) -> heapless::String<16> {
    let mut out = heapless::String::new();
    let _ = out.push_str(VERSION_TAG);
    let _ = out.push(':');
    let _ = out.push_str(kind.tag());
    out
}
