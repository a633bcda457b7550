//! Per-device context and the actions handlers ask the caller to perform.
//!
//! `GateContext` is the blackboard every handler reads and writes.  It is
//! injected at construction and serde-serializable so the host can
//! persist it between runs; unset fields mean "not yet initialized" and
//! are never read as CLOSED.

use serde::{Deserialize, Serialize};

use super::{DoorState, TargetState};

// ---------------------------------------------------------------------------
// GateContext
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GateContext {
    /// Last state derived from a raw contact reading (OPEN or CLOSED).
    pub current_state: Option<DoorState>,
    /// Last published door state.
    pub last_state: Option<DoorState>,
    /// Desired end state.
    pub target_state: Option<TargetState>,
    pub obstruction_detected: Option<bool>,
}

impl GateContext {
    /// All fields the first status reply fills in are set.
    pub fn is_initialized(&self) -> bool {
        self.last_state.is_some()
            && self.target_state.is_some()
            && self.obstruction_detected.is_some()
    }

    /// `lastState` is OPENING or CLOSING.
    pub fn is_transitional(&self) -> bool {
        self.last_state.is_some_and(DoorState::is_transitional)
    }

    /// `lastState` and `targetState` equal the given pair.
    pub fn is(&self, last: DoorState, target: TargetState) -> bool {
        self.last_state == Some(last) && self.target_state == Some(target)
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A value the engine publishes to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Published {
    /// The door-state characteristic (mirrors `lastState`).
    CurrentState(DoorState),
    TargetState(TargetState),
    Obstruction(bool),
}

/// One side effect requested by a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Issue a get-status request.
    RequestStatus,
    /// Issue a switch-set request (start or stop the gate motor).
    TriggerSwitch,
    Publish(Published),
    /// Arm (or re-arm) the settle check for this context.
    ArmCheck { after_secs: u32 },
    /// Cancel the settle check if one is armed.
    CancelCheck,
}

/// Upper bound of actions a single event produces.
pub const MAX_ACTIONS: usize = 8;

/// Ordered, fixed-capacity action list returned by every handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actions(heapless::Vec<Action, MAX_ACTIONS>);

impl Actions {
    pub fn new() -> Self {
        Self(heapless::Vec::new())
    }

    pub fn push(&mut self, action: Action) {
        if self.0.push(action).is_err() {
            debug_assert!(false, "action list overflow");
            log::error!("Gate: action list full, dropped {:?}", action);
        }
    }

    pub fn publish(&mut self, value: Published) {
        self.push(Action::Publish(value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.0.iter()
    }

    pub fn contains(&self, action: &Action) -> bool {
        self.0.contains(action)
    }

    /// Number of actions matching `pred`.
    pub fn count(&self, pred: impl Fn(&Action) -> bool) -> usize {
        self.0.iter().filter(|a| pred(a)).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Actions {
    type Item = Action;
    type IntoIter = <heapless::Vec<Action, MAX_ACTIONS> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
