//! Scripted in-memory relay.
//!
//! Implements `Connector`/`Link` and answers every request the way a
//! Shelly relay does, from a shared contact state the test controls.
//! Replies travel over an `mpsc` channel so `recv_text` blocks briefly
//! like a socket read timeout.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use drivegate::error::ConnectionError;
use drivegate::rpc::transport::{Connector, Link};
use serde_json::{Value, json};

#[derive(Default)]
pub struct DeviceState {
    pub sensor_open: bool,
    pub connects: u32,
    /// Method of every request received, in order.
    pub methods: Vec<String>,
    pub refuse_connects: u32,
    pub drop_next_write: bool,
    /// Reply path of the current link.
    tx: Option<Sender<String>>,
}

#[derive(Clone, Default)]
pub struct ScriptedDevice {
    state: Arc<Mutex<DeviceState>>,
}

#[allow(dead_code)]
impl ScriptedDevice {
    pub fn new(sensor_open: bool) -> Self {
        let device = Self::default();
        device.state.lock().unwrap().sensor_open = sensor_open;
        device
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut DeviceState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn count(&self, method: &str) -> usize {
        self.with(|s| s.methods.iter().filter(|m| *m == method).count())
    }

    /// Change the contact and push a NotifyStatus on the open link.
    pub fn notify_input(&self, sensor_open: bool) {
        self.with(|s| {
            s.sensor_open = sensor_open;
            let frame = json!({
                "src": "shellyplus1-test",
                "dst": "Driveway",
                "method": "NotifyStatus",
                "params": {"ts": 1700000000.25, "input:0": {"id": 0, "state": sensor_open}},
            });
            if let Some(tx) = &s.tx {
                let _ = tx.send(frame.to_string());
            }
        });
    }
}

impl Connector for ScriptedDevice {
    type Link = ScriptedLink;

    fn connect(&mut self) -> Result<ScriptedLink, ConnectionError> {
        let mut s = self.state.lock().unwrap();
        s.connects += 1;
        if s.refuse_connects > 0 {
            s.refuse_connects -= 1;
            return Err(ConnectionError::Connect);
        }
        let (tx, rx) = mpsc::channel();
        s.tx = Some(tx.clone());
        Ok(ScriptedLink {
            state: self.state.clone(),
            tx,
            rx,
        })
    }

    fn endpoint(&self) -> &str {
        "ws://scripted/rpc"
    }
}

pub struct ScriptedLink {
    state: Arc<Mutex<DeviceState>>,
    tx: Sender<String>,
    rx: Receiver<String>,
}

impl Link for ScriptedLink {
    fn send_text(&mut self, text: &str) -> Result<(), ConnectionError> {
        let mut s = self.state.lock().unwrap();
        if std::mem::take(&mut s.drop_next_write) {
            return Err(ConnectionError::Write);
        }

        let request: Value = serde_json::from_str(text).unwrap();
        let method = request["method"].as_str().unwrap().to_string();
        let result = match method.as_str() {
            "Shelly.GetStatus" => json!({
                "input:0": {"id": 0, "state": s.sensor_open},
                "switch:0": {"id": 0, "source": "WS_in", "output": false},
            }),
            "Shelly.GetDeviceInfo" => json!({
                "name": "Gate relay", "id": "shellyplus1-test", "mac": "AABBCCDDEEFF",
                "model": "SNSW-001X16EU", "gen": 2, "fw_id": "20231107-164738/1.0.8-g",
                "ver": "1.0.8", "app": "Plus1",
            }),
            "Switch.Set" => json!({"was_on": false}),
            other => panic!("unexpected method {other}"),
        };
        s.methods.push(method);

        let reply = json!({
            "id": request["id"],
            "src": "shellyplus1-test",
            "dst": request["src"],
            "result": result,
        });
        self.tx.send(reply.to_string()).map_err(|_| ConnectionError::Write)
    }

    fn recv_text(&mut self) -> Result<Option<String>, ConnectionError> {
        match self.rx.recv_timeout(Duration::from_millis(10)) {
            Ok(text) => Ok(Some(text)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ConnectionError::Closed),
        }
    }

    fn close(&mut self) {
        self.state.lock().unwrap().tx = None;
    }
}
