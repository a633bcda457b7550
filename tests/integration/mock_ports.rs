//! Mock adapters for integration tests.
//!
//! Records every request and every published event so tests can assert
//! on the full history without a device or a socket.

use drivegate::app::events::AppEvent;
use drivegate::app::ports::{CommandPort, EventSink, SendError};
use drivegate::config::DeviceConfig;
use drivegate::fsm::{DoorState, GateContext, TargetState};
use drivegate::rpc::codec::{Command, InboundMessage, Method, decode};

// ── MockCommandPort ───────────────────────────────────────────

#[derive(Default)]
pub struct MockCommandPort {
    pub sent: Vec<Command>,
    /// When set, every send fails as if the queue were full.
    pub full: bool,
}

#[allow(dead_code)]
impl MockCommandPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, method: Method) -> usize {
        self.sent.iter().filter(|c| c.method == method).count()
    }

    pub fn last_id(&self, method: Method) -> Option<u32> {
        self.sent.iter().rev().find(|c| c.method == method).map(|c| c.id)
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl CommandPort for MockCommandPort {
    fn send(&mut self, cmd: &Command) -> Result<(), SendError> {
        if self.full {
            return Err(SendError::QueueFull);
        }
        self.sent.push(cmd.clone());
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn count(&self, event: &AppEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub fn device() -> DeviceConfig {
    DeviceConfig {
        id: "gate-1".into(),
        name: "Driveway".into(),
        hostname: "192.168.1.50".into(),
        open_time: 15,
        close_time: 20,
        obstruction_detection: true,
    }
}

pub fn context(last: DoorState, target: TargetState) -> GateContext {
    let current = if last == DoorState::Open { DoorState::Open } else { DoorState::Closed };
    GateContext {
        current_state: Some(current),
        last_state: Some(last),
        target_state: Some(target),
        obstruction_detected: Some(false),
    }
}

/// A get-status reply frame as the relay sends it.
#[allow(dead_code)]
pub fn status_frame(id: u32, sensor_open: bool) -> InboundMessage {
    let text = format!(
        r#"{{"id":{id},"src":"shellyplus1-a8032ab12345","dst":"Driveway","result":{{"input:0":{{"id":0,"state":{sensor_open}}},"switch:0":{{"id":0,"output":false}}}}}}"#
    );
    decode(&text).unwrap()
}

/// A NotifyStatus frame carrying an input change.
#[allow(dead_code)]
pub fn input_notification(sensor_open: bool) -> InboundMessage {
    let text = format!(
        r#"{{"src":"shellyplus1-a8032ab12345","dst":"Driveway","method":"NotifyStatus","params":{{"ts":1700000000.5,"input:0":{{"id":0,"state":{sensor_open}}}}}}}"#
    );
    decode(&text).unwrap()
}
