//! Actor → I/O thread channel.
//!
//! Uses an `embassy-sync` bounded channel to bridge a device's actor
//! with its I/O thread.  Unlike a single-device firmware the channels are
//! per device, so they live in the device's shared state rather than in
//! statics.
//!
//! ```text
//! ┌──────────────┐  OutboundMsg  ┌──────────────┐
//! │  Gate actor  │──────────────▶│  I/O thread  │
//! │  (executor)  │◀──────────────│  (session)   │
//! └──────────────┘   GateEvent   └──────────────┘
//! ```
//!
//! The reverse direction is the device's event queue (see
//! [`crate::events`]).

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Outbound message from the actor, delivered to the I/O thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMsg {
    /// One encoded request frame.
    Frame(String),
    /// Close the session and stop the I/O thread.
    Shutdown,
}

/// Channel depth for outbound frames.
pub const OUTBOUND_DEPTH: usize = 8;

/// Outbound frame channel: actor → I/O thread.
pub type OutboundQueue = Channel<CriticalSectionRawMutex, OutboundMsg, OUTBOUND_DEPTH>;
