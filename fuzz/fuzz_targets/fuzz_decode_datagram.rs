//! Fuzz target: `decode_datagram`
//!
//! Arbitrary bytes off the UDP socket must decode to a request or an
//! error, never panic, and anything accepted must carry the version tag.
//!
//! cargo fuzz run fuzz_decode_datagram

#![no_main]

use garagedoor::net::protocol::{decode_datagram, encode, MAX_DATAGRAM_LEN, VERSION_TAG};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(kind) = decode_datagram(data) {
        assert!(data.len() <= MAX_DATAGRAM_LEN);
        assert!(data.starts_with(VERSION_TAG.as_bytes()));
        // The canonical request text for what we decoded is a prefix.
        assert!(data.starts_with(encode(kind).as_bytes()));
    }
});
