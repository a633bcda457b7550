//! Outbound application events.
//!
//! The [`GateService`](super::service::GateService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::fsm::{DoorState, GateContext, Published, TargetState};
use crate::rpc::messages::DeviceInfo;

/// Manufacturer reported for every relay.
pub const MANUFACTURER: &str = "Shelly";

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started (carries the injected context).
    Started(GateContext),

    /// The published door state changed (mirrors `lastState`).
    CurrentState(DoorState),

    TargetState(TargetState),

    ObstructionDetected(bool),

    /// Device identity learned from the device-info reply.
    AccessoryInfo(AccessoryInfo),

    /// Status requests went unanswered; published state may be stale.
    StatusStale,
}

impl From<Published> for AppEvent {
    fn from(value: Published) -> Self {
        match value {
            Published::CurrentState(s) => Self::CurrentState(s),
            Published::TargetState(t) => Self::TargetState(t),
            Published::Obstruction(o) => Self::ObstructionDetected(o),
        }
    }
}

/// Accessory identity shown by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryInfo {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware_revision: String,
    pub name: String,
}

impl AccessoryInfo {
    /// Build from a device-info reply; `fallback_name` is used when the
    /// device has no name configured.
    pub fn from_device_info(info: &DeviceInfo, fallback_name: &str) -> Self {
        Self {
            manufacturer: MANUFACTURER.to_string(),
            model: info.model.clone(),
            serial_number: info.mac.clone(),
            firmware_revision: info.ver.clone(),
            name: info
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| fallback_name.to_string()),
        }
    }
}
