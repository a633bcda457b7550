//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GateService (domain)
//! ```
//!
//! Driven adapters (outbound queue, event sinks, clocks) implement these
//! traits.  The [`GateService`](super::service::GateService) consumes them
//! via generics, so the domain core never touches a socket or a thread.

use core::fmt;

use crate::rpc::codec::Command;
use crate::scheduler::CheckKey;

// ───────────────────────────────────────────────────────────────
// Command port (driven adapter: domain → device)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain hands requests to the transport.
///
/// Fire-and-forget: `Ok` means the request was queued, not delivered.
pub trait CommandPort {
    fn send(&mut self, cmd: &Command) -> Result<(), SendError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → UI / logging)
// ───────────────────────────────────────────────────────────────

/// The domain publishes structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (log, UI snapshot).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds; only differences are meaningful.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the actor)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a check is due.
///
/// The [`Scheduler`](crate::scheduler::Scheduler) knows nothing about
/// contexts or events; the service implements this to collect fired
/// checks and handle them on its own loop.
pub trait SchedulerDelegate {
    fn on_check_fired(&mut self, key: &CheckKey);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`CommandPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The outbound queue is full; the request was dropped.
    QueueFull,
    /// The request could not be serialized.
    Encode,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "outbound queue full"),
            Self::Encode => write!(f, "encode failed"),
        }
    }
}

impl std::error::Error for SendError {}
