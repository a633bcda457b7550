//! Thread-safe surface of one gate, held by the UI layer.
//!
//! Reads are served from a snapshot the actor keeps current through
//! [`SnapshotSink`](crate::adapters::snapshot_sink::SnapshotSink); writes
//! are fire-and-forget events on the gate's queue.

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::warn;

use crate::events::{EventQueue, GateEvent, push_event};
use crate::fsm::{DoorState, TargetState};

use super::commands::GateCommand;
use super::events::{AccessoryInfo, AppEvent};

/// Last published values of one gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateSnapshot {
    pub current: Option<DoorState>,
    pub target: Option<TargetState>,
    pub obstruction: bool,
    pub info: Option<AccessoryInfo>,
    /// Set when status requests went unanswered; cleared by the next
    /// published door state.
    pub stale: bool,
}

impl GateSnapshot {
    /// Fold one published event into the snapshot.
    pub fn apply(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(ctx) => {
                self.current = ctx.last_state;
                self.target = ctx.target_state;
                self.obstruction = ctx.obstruction_detected.unwrap_or(false);
            }
            AppEvent::CurrentState(state) => {
                self.current = Some(*state);
                self.stale = false;
            }
            AppEvent::TargetState(target) => self.target = Some(*target),
            AppEvent::ObstructionDetected(flag) => self.obstruction = *flag,
            AppEvent::AccessoryInfo(info) => self.info = Some(info.clone()),
            AppEvent::StatusStale => self.stale = true,
        }
    }
}

/// State shared between the actor and every [`GateHandle`].
pub struct GateShared {
    id: String,
    events: EventQueue,
    snapshot: Mutex<CriticalSectionRawMutex, RefCell<GateSnapshot>>,
}

impl GateShared {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            events: EventQueue::new(),
            snapshot: Mutex::new(RefCell::new(GateSnapshot::default())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn record(&self, event: &AppEvent) {
        self.snapshot.lock(|s| s.borrow_mut().apply(event));
    }

    pub fn snapshot(&self) -> GateSnapshot {
        self.snapshot.lock(|s| s.borrow().clone())
    }
}

/// Cloneable handle to one running gate.
#[derive(Clone)]
pub struct GateHandle {
    shared: Arc<GateShared>,
}

impl GateHandle {
    pub fn new(shared: Arc<GateShared>) -> Self {
        Self { shared }
    }

    pub fn id(&self) -> &str {
        self.shared.id()
    }

    pub fn get_current_state(&self) -> Option<DoorState> {
        self.shared.snapshot().current
    }

    pub fn get_target_state(&self) -> Option<DoorState> {
        self.shared.snapshot().target.map(DoorState::from)
    }

    pub fn get_obstruction_detected(&self) -> bool {
        self.shared.snapshot().obstruction
    }

    pub fn accessory_info(&self) -> Option<AccessoryInfo> {
        self.shared.snapshot().info
    }

    pub fn snapshot(&self) -> GateSnapshot {
        self.shared.snapshot()
    }

    /// Request a new target.  Only OPEN and CLOSED are accepted; returns
    /// `false` if the value was rejected or the queue is full.
    pub fn set_target_state(&self, state: DoorState) -> bool {
        let Some(target) = TargetState::from_door(state) else {
            warn!("Gate[{}]: rejected non-stable target {}", self.shared.id(), state);
            return false;
        };
        push_event(self.shared.events(), GateEvent::Command(GateCommand::SetTarget(target)))
    }

    /// Ask for a status re-poll.
    pub fn refresh(&self) -> bool {
        push_event(self.shared.events(), GateEvent::Command(GateCommand::Refresh))
    }
}
