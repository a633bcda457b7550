//! Door-state reconciliation engine.
//!
//! Three sources of truth feed one context: the last commanded target,
//! the last confirmed status reply and unsolicited contact notifications.
//! Every input is a plain function over [`GateContext`] that returns the
//! side effects it wants as a list of [`Action`]s; the caller performs them.
//!
//! ```text
//!              set(OPEN)              status: open
//!   CLOSED ──────────────▶ OPENING ──────────────────▶ OPEN
//!     ▲  ▲                    │                          │
//!     │  └── status: closed ──┘ (obstruction)            │ set(CLOSED)
//!     │                                                  ▼
//!     └─────────── status / notify: closed ─────────── CLOSING
//!
//!   OPENING | CLOSING ──set(any)──▶ STOPPED ──set(t)──▶ OPENING | CLOSING
//! ```
//!
//! The engine never performs I/O and never reads a clock; deferred checks
//! are requested by duration and the caller decides when they fire.

pub mod context;
pub mod handlers;

use core::fmt;

use serde::{Deserialize, Serialize};

pub use context::{Action, Actions, GateContext, Published};

// ---------------------------------------------------------------------------
// Door state
// ---------------------------------------------------------------------------

/// Physical door state as exposed to the UI layer.
///
/// The ordinals are an external contract and are what the context
/// serializes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum DoorState {
    Open = 0,
    Closed = 1,
    Opening = 2,
    Closing = 3,
    Stopped = 4,
}

impl DoorState {
    /// Total number of states.
    pub const COUNT: usize = 5;

    /// Map a raw contact reading (true = not closed) to a stable state.
    pub fn from_contact(sensor_open: bool) -> Self {
        if sensor_open { Self::Open } else { Self::Closed }
    }

    pub fn is_transitional(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Opening => "OPENING",
            Self::Closing => "CLOSING",
            Self::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DoorState> for u8 {
    fn from(state: DoorState) -> Self {
        state as u8
    }
}

impl TryFrom<u8> for DoorState {
    type Error = InvalidOrdinal;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Open),
            1 => Ok(Self::Closed),
            2 => Ok(Self::Opening),
            3 => Ok(Self::Closing),
            4 => Ok(Self::Stopped),
            other => Err(InvalidOrdinal(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Target state
// ---------------------------------------------------------------------------

/// Desired end state.  Only the two stable states are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum TargetState {
    Open = 0,
    Closed = 1,
}

impl TargetState {
    /// The stable target matching `state`, if it is stable.
    pub fn from_door(state: DoorState) -> Option<Self> {
        match state {
            DoorState::Open => Some(Self::Open),
            DoorState::Closed => Some(Self::Closed),
            _ => None,
        }
    }

    /// The transitional state travelled through to reach this target.
    pub fn travel_state(self) -> DoorState {
        match self {
            Self::Open => DoorState::Opening,
            Self::Closed => DoorState::Closing,
        }
    }
}

impl From<TargetState> for DoorState {
    fn from(target: TargetState) -> Self {
        match target {
            TargetState::Open => DoorState::Open,
            TargetState::Closed => DoorState::Closed,
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DoorState::from(*self).fmt(f)
    }
}

impl From<TargetState> for u8 {
    fn from(target: TargetState) -> Self {
        target as u8
    }
}

impl TryFrom<u8> for TargetState {
    type Error = InvalidOrdinal;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Open),
            1 => Ok(Self::Closed),
            other => Err(InvalidOrdinal(other)),
        }
    }
}

/// An ordinal outside the state's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidOrdinal(pub u8);

impl fmt::Display for InvalidOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid state ordinal: {}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Travel timing
// ---------------------------------------------------------------------------

/// Per-device travel durations and obstruction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub open_secs: u32,
    pub close_secs: u32,
    /// When false the obstruction flag is never raised (clearing still applies).
    pub obstruction_detection: bool,
}

impl Timing {
    /// Seconds to wait before checking that `target` was reached.
    pub fn travel_secs(&self, target: TargetState) -> u32 {
        match target {
            TargetState::Open => self.open_secs,
            TargetState::Closed => self.close_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns one device's [`GateContext`] and routes engine events to the
/// handler functions in [`handlers`].
pub struct Reconciler {
    ctx: GateContext,
    timing: Timing,
}

impl Reconciler {
    /// Build an engine around an injected (possibly restored) context.
    pub fn new(ctx: GateContext, timing: Timing) -> Self {
        Self { ctx, timing }
    }

    pub fn context(&self) -> &GateContext {
        &self.ctx
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Re-arm the settle check of a context restored mid-transition.
    pub fn resume(&self) -> Actions {
        handlers::resume(&self.ctx, &self.timing)
    }

    pub fn on_set_request(&mut self, target: TargetState) -> Actions {
        handlers::set_request(&mut self.ctx, &self.timing, target)
    }

    pub fn on_status_reply(&mut self, sensor_open: bool) -> Actions {
        handlers::status_reply(&mut self.ctx, &self.timing, sensor_open)
    }

    pub fn on_notification(&mut self, sensor_open: bool) -> Actions {
        handlers::notification(&mut self.ctx, &self.timing, sensor_open)
    }

    pub fn on_check_due(&self) -> Actions {
        handlers::check_due(&self.ctx)
    }
}
