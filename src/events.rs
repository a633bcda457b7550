//! Per-device event queue.
//!
//! Events are produced by:
//! - the UI handle (set-target / refresh requests)
//! - the I/O thread (decoded replies and notifications)
//! - the runtime itself (shutdown)
//!
//! They are consumed by the device's actor one at a time, in arrival
//! order.  Deferred checks do not go through the queue: the actor wakes
//! on its own timer and fires them from the scheduler.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ GateHandle  │────▶│              │     │              │
//! │ I/O thread  │────▶│  Event Queue │────▶│  Gate actor  │
//! │ Runtime     │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::commands::GateCommand;
use crate::rpc::codec::InboundMessage;

/// Maximum number of pending events per device.
pub const EVENT_QUEUE_CAP: usize = 16;

/// Everything a gate actor reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum GateEvent {
    /// A request from the UI layer.
    Command(GateCommand),
    /// A decoded frame from the device.
    Message(InboundMessage),
    /// Stop the actor.
    Shutdown,
}

/// Multi-producer, single-consumer queue of one device.
pub type EventQueue = Channel<CriticalSectionRawMutex, GateEvent, EVENT_QUEUE_CAP>;

/// Push an event without blocking.
/// Returns `false` if the queue is full (the event is dropped).
pub fn push_event(queue: &EventQueue, event: GateEvent) -> bool {
    match queue.try_send(event) {
        Ok(()) => true,
        Err(embassy_sync::channel::TrySendError::Full(dropped)) => {
            warn!("Events: queue full, dropped {:?}", dropped);
            false
        }
    }
}

/// Pop the next pending event, if any.
pub fn pop_event(queue: &EventQueue) -> Option<GateEvent> {
    queue.try_receive().ok()
}

/// Drain all pending events into a callback, FIFO.
pub fn drain_events(queue: &EventQueue, mut handler: impl FnMut(GateEvent)) {
    while let Some(event) = pop_event(queue) {
        handler(event);
    }
}
