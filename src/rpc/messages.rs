//! Wire payload types of the relay's JSON-RPC dialect.
//!
//! Only the fields the gate controller reads are modelled; everything else
//! in a reply is ignored.  All fields are lenient (`default`) because
//! firmware revisions differ in what they include.

use serde::{Deserialize, Serialize};

/// Result of `Shelly.GetDeviceInfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    pub name: Option<String>,
    pub id: String,
    pub mac: String,
    pub model: String,
    #[serde(rename = "gen")]
    pub generation: u8,
    pub fw_id: String,
    pub ver: String,
    pub app: String,
}

/// `input:0` object of a status reply or notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InputStatus {
    pub id: u8,
    /// Contact state; `null` when the input is not configured as a switch.
    pub state: Option<bool>,
}

/// `switch:0` object of a status reply or notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SwitchStatus {
    pub id: u8,
    pub source: Option<String>,
    pub output: Option<bool>,
}

/// Result of `Switch.Set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SwitchSetResult {
    pub was_on: bool,
}

/// `error` object of a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// `params` of the only request carrying any: turn output 0 on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwitchSetParams {
    pub id: u8,
    pub on: bool,
}

impl Default for SwitchSetParams {
    fn default() -> Self {
        Self { id: 0, on: true }
    }
}
