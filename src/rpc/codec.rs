//! JSON frame codec.
//!
//! Wire format (one JSON object per WebSocket text frame):
//! ```text
//! request       {"id":7,"src":"Driveway","method":"Switch.Set","params":{"id":0,"on":true}}
//! reply         {"id":7,"src":"shellyplus1-…","dst":"Driveway","result":{…}}
//! error reply   {"id":7,"src":"…","dst":"…","error":{"code":-103,"message":"…"}}
//! notification  {"src":"…","dst":"…","method":"NotifyStatus","params":{"ts":…,"input:0":{…}}}
//! ```
//!
//! Replies are classified by the keys present in `result`; notifications
//! by the channel objects present in `params`.  Anything else is a
//! [`CodecError`] and never reaches the engine.

use log::{debug, error};
use serde::Serialize;
use serde_json::{Map, Value};

use super::messages::{
    DeviceInfo, InputStatus, RpcErrorBody, SwitchSetParams, SwitchSetResult, SwitchStatus,
};
use super::transport::FrameHandler;
use crate::error::CodecError;

const INPUT_KEY: &str = "input:0";
const SWITCH_KEY: &str = "switch:0";

// ---------------------------------------------------------------------------
// Outgoing requests
// ---------------------------------------------------------------------------

/// The three calls the controller issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GetDeviceInfo,
    GetStatus,
    SwitchSet,
}

impl Method {
    pub const COUNT: usize = 3;
    pub const ALL: [Self; Self::COUNT] = [Self::GetDeviceInfo, Self::GetStatus, Self::SwitchSet];

    /// Name on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetDeviceInfo => "Shelly.GetDeviceInfo",
            Self::GetStatus => "Shelly.GetStatus",
            Self::SwitchSet => "Switch.Set",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Correlation id (never 0).
    pub id: u32,
    /// Source tag echoed back as `dst`; the configured device name.
    pub src: String,
    pub method: Method,
}

#[derive(Serialize)]
struct RequestFrame<'a> {
    id: u32,
    src: &'a str,
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<SwitchSetParams>,
}

/// Serialize a request into one text frame.
pub fn encode(cmd: &Command) -> Result<String, CodecError> {
    let frame = RequestFrame {
        id: cmd.id,
        src: &cmd.src,
        method: cmd.method.as_str(),
        params: (cmd.method == Method::SwitchSet).then(SwitchSetParams::default),
    };
    serde_json::to_string(&frame).map_err(|_| CodecError::Encode)
}

// ---------------------------------------------------------------------------
// Incoming frames
// ---------------------------------------------------------------------------

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    DeviceInfo { id: u64, info: DeviceInfo },
    Status { id: u64, sensor_open: bool },
    SwitchSet { id: u64, was_on: bool },
    RpcError { id: u64, code: i64, message: String },
    Notification { method: String, ts: Option<f64>, kind: NotificationKind },
}

impl InboundMessage {
    /// Correlation id of a reply; `None` for notifications.
    pub fn reply_id(&self) -> Option<u64> {
        match self {
            Self::DeviceInfo { id, .. }
            | Self::Status { id, .. }
            | Self::SwitchSet { id, .. }
            | Self::RpcError { id, .. } => Some(*id),
            Self::Notification { .. } => None,
        }
    }
}

/// Payload of an asynchronous notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// The contact input changed.
    Input { sensor_open: bool },
    /// Only the relay output changed.
    Switch { output: Option<bool> },
    /// Anything else (system, wifi, …).
    Other,
}

/// Parse and classify one text frame.
pub fn decode(text: &str) -> Result<InboundMessage, CodecError> {
    let value: Value = serde_json::from_str(text).map_err(|_| CodecError::InvalidJson)?;
    let Value::Object(frame) = value else {
        return Err(CodecError::UnrecognizedShape);
    };

    match (frame.get("id"), frame.get("method")) {
        (Some(id), _) if !id.is_null() => {
            let id = id.as_u64().ok_or(CodecError::UnrecognizedShape)?;
            decode_reply(id, &frame)
        }
        (_, Some(Value::String(method))) => decode_notification(method, &frame),
        _ => Err(CodecError::UnrecognizedShape),
    }
}

fn decode_reply(id: u64, frame: &Map<String, Value>) -> Result<InboundMessage, CodecError> {
    if let Some(err) = frame.get("error") {
        let body: RpcErrorBody =
            serde_json::from_value(err.clone()).map_err(|_| CodecError::UnrecognizedShape)?;
        return Ok(InboundMessage::RpcError {
            id,
            code: body.code,
            message: body.message,
        });
    }

    let Some(Value::Object(result)) = frame.get("result") else {
        return Err(CodecError::UnrecognizedShape);
    };

    if result.contains_key("name") || result.contains_key("id") {
        let info: DeviceInfo = serde_json::from_value(Value::Object(result.clone()))
            .map_err(|_| CodecError::UnrecognizedShape)?;
        return Ok(InboundMessage::DeviceInfo { id, info });
    }

    if result.contains_key(INPUT_KEY) || result.contains_key("sys") {
        let sensor_open = input_state(result)?.ok_or(CodecError::MissingReading)?;
        return Ok(InboundMessage::Status { id, sensor_open });
    }

    if result.contains_key("was_on") {
        let set: SwitchSetResult = serde_json::from_value(Value::Object(result.clone()))
            .map_err(|_| CodecError::UnrecognizedShape)?;
        return Ok(InboundMessage::SwitchSet {
            id,
            was_on: set.was_on,
        });
    }

    Err(CodecError::UnrecognizedShape)
}

fn decode_notification(
    method: &str,
    frame: &Map<String, Value>,
) -> Result<InboundMessage, CodecError> {
    let params = match frame.get("params") {
        Some(Value::Object(p)) => Some(p),
        None | Some(Value::Null) => None,
        Some(_) => return Err(CodecError::UnrecognizedShape),
    };

    let ts = params.and_then(|p| p.get("ts")).and_then(Value::as_f64);
    let kind = match params {
        Some(p) if p.get(INPUT_KEY).is_some_and(|v| !v.is_null()) => {
            let sensor_open = input_state(p)?.ok_or(CodecError::MissingReading)?;
            NotificationKind::Input { sensor_open }
        }
        Some(p) if p.get(SWITCH_KEY).is_some_and(|v| !v.is_null()) => NotificationKind::Switch {
            output: switch_status(p).and_then(|s| s.output),
        },
        _ => NotificationKind::Other,
    };

    Ok(InboundMessage::Notification {
        method: method.to_string(),
        ts,
        kind,
    })
}

/// `input:0.state`, `Ok(None)` if the object or its state is absent/null.
fn input_state(obj: &Map<String, Value>) -> Result<Option<bool>, CodecError> {
    match obj.get(INPUT_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let input: InputStatus =
                serde_json::from_value(v.clone()).map_err(|_| CodecError::UnrecognizedShape)?;
            Ok(input.state)
        }
    }
}

fn switch_status(obj: &Map<String, Value>) -> Option<SwitchStatus> {
    obj.get(SWITCH_KEY)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

// ---------------------------------------------------------------------------
// Decoding frame handler
// ---------------------------------------------------------------------------

/// The session's frame handler: decodes each frame and forwards typed
/// messages.  Malformed frames are logged and dropped here.
pub struct DecodingHandler<F: FnMut(InboundMessage)> {
    label: String,
    forward: F,
}

impl<F: FnMut(InboundMessage)> DecodingHandler<F> {
    pub fn new(label: impl Into<String>, forward: F) -> Self {
        Self {
            label: label.into(),
            forward,
        }
    }
}

impl<F: FnMut(InboundMessage)> FrameHandler for DecodingHandler<F> {
    fn on_frame(&mut self, text: &str) {
        match decode(text) {
            Ok(msg) => {
                debug!("IO[{}]: << {:?}", self.label, msg);
                (self.forward)(msg);
            }
            Err(e) => {
                error!("IO[{}]: dropped frame ({}): {:.120}", self.label, e, text);
            }
        }
    }
}
