//! Fuzz target: `EdgeDetector::on_transition`
//!
//! Each input byte is one notification: bit 7 is the raw level, the low
//! seven bits the milliseconds since the previous one.  The counters must
//! always account for every call and the debounced flag must agree with
//! the last accepted transition.
//!
//! cargo fuzz run fuzz_edge_detector

#![no_main]

use garagedoor::drivers::edge_detector::{EdgeDetector, Transition};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&config, edges)) = data.split_first() else {
        return;
    };
    let debounce = u32::from(config & 0x3F);
    let max_matched = if config & 0x40 != 0 { debounce + 64 } else { 0 };
    let det = EdgeDetector::new(4, config & 0x80 != 0, debounce, max_matched).seeded(false, 0);

    let mut now = 0u32;
    let mut matched = det.is_matched();
    for &b in edges {
        now = now.wrapping_add(u32::from(b & 0x7F));
        match det.on_transition(b & 0x80 != 0, now) {
            Transition::Matched => matched = true,
            Transition::Unmatched => matched = false,
            Transition::Unchanged | Transition::Spurious => {}
        }
        assert_eq!(det.is_matched(), matched);
    }

    let s = det.stats();
    assert_eq!(s.invoked as usize, edges.len());
    assert_eq!(s.invoked, s.discarded_unchanged + s.matched + s.unmatched + s.spurious);
});
