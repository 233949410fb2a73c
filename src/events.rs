//! Interrupt-to-poll-loop event queue.
//!
//! GPIO interrupt handlers never log, touch the network or block.  Anything
//! the poll loop needs to react to is pushed here as a tagged [`Event`] and
//! drained once per loop iteration.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ GPIO ISRs   │────▶│  Event Queue │────▶│  Poll Loop   │
//! │ (detectors) │     │  (lock-free) │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::mpmc::Q32;

/// Which monitored line raised an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorLine {
    Open,
    Closed,
    Light,
    Switch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Manual switch entered its matched state.
    SwitchPressed,
    /// A boundary sensor produced a classified transition.
    BoundaryEdge(SensorLine),
    /// The light-status line produced a classified transition.
    LightEdge,
    /// A transition was rejected as bounce or implausible duration.
    Spurious(SensorLine),
}

pub type EventQueue = Q32<Event>;

static EVENTS: EventQueue = EventQueue::new();
static DROPPED: AtomicU32 = AtomicU32::new(0);

/// Push onto `queue`; a full queue drops the event and counts it.
pub fn push_to(queue: &EventQueue, event: Event) -> bool {
    if queue.enqueue(event).is_ok() {
        true
    } else {
        DROPPED.fetch_add(1, Ordering::Relaxed);
        false
    }
}

/// Drain every pending event from `queue` in FIFO order.
pub fn drain_from(queue: &EventQueue, mut handler: impl FnMut(Event)) -> usize {
    let mut n = 0;
    while let Some(event) = queue.dequeue() {
        handler(event);
        n += 1;
    }
    n
}

/// ISR-safe push onto the global queue.
pub fn push_event(event: Event) -> bool {
    push_to(&EVENTS, event)
}

/// Poll-loop side of the global queue.
pub fn drain_events(handler: impl FnMut(Event)) -> usize {
    drain_from(&EVENTS, handler)
}

/// Events lost to a full queue since boot.
pub fn dropped_events() -> u32 {
    DROPPED.load(Ordering::Relaxed)
}
