//! Gateway configuration.
//!
//! One JSON document lists the managed gates plus optional transport and
//! watchdog tuning.  Keys are camelCase to match the host platform's
//! accessory configuration:
//!
//! ```json
//! {
//!   "devices": [
//!     { "id": "gate-1", "name": "Driveway", "hostname": "192.168.1.50",
//!       "openTime": 15, "closeTime": 20, "obstructionDetection": true }
//!   ],
//!   "transport": { "port": 80, "path": "/rpc" },
//!   "watchdog": { "replyTimeoutSecs": 10, "maxStatusRetries": 2 }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fsm::Timing;

/// Maximum length of a device id (it doubles as the scheduler key).
pub const MAX_ID_LEN: usize = 48;

/// Upper bound for configured open/close durations (seconds).
const MAX_TRAVEL_SECS: u32 = 600;

/// Identity of one managed gate context.
pub type ContextId = heapless::String<MAX_ID_LEN>;

// ---------------------------------------------------------------------------
// Per-device configuration
// ---------------------------------------------------------------------------

/// Configuration of one gate actuator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    /// Stable identifier of the accessory.
    pub id: String,
    /// Display name; also sent as the `src` of every request.
    pub name: String,
    /// Hostname or IP of the relay, optionally with `:port`.
    pub hostname: String,
    /// Seconds the gate needs to open fully.
    pub open_time: u32,
    /// Seconds the gate needs to close fully.
    pub close_time: u32,
    /// Raise the obstruction flag when a transition overruns.
    #[serde(default = "default_true")]
    pub obstruction_detection: bool,
}

fn default_true() -> bool {
    true
}

impl DeviceConfig {
    /// Validate ranges; rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::ValidationFailed("device id is empty"));
        }
        if self.id.len() > MAX_ID_LEN {
            return Err(ConfigError::ValidationFailed("device id longer than 48 bytes"));
        }
        if !is_printable_ascii(&self.id) {
            return Err(ConfigError::ValidationFailed("device id must be printable ASCII"));
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("device name is empty"));
        }
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("device hostname is empty"));
        }
        if self.open_time == 0 || self.open_time > MAX_TRAVEL_SECS {
            return Err(ConfigError::ValidationFailed("openTime must be 1..=600 seconds"));
        }
        if self.close_time == 0 || self.close_time > MAX_TRAVEL_SECS {
            return Err(ConfigError::ValidationFailed("closeTime must be 1..=600 seconds"));
        }
        Ok(())
    }

    /// The scheduler/context key for this device.
    pub fn context_id(&self) -> Result<ContextId, ConfigError> {
        let mut id = ContextId::new();
        id.push_str(&self.id)
            .map_err(|()| ConfigError::ValidationFailed("device id longer than 48 bytes"))?;
        Ok(id)
    }

    /// Travel timing handed to the reconciliation engine.
    pub fn timing(&self) -> Timing {
        Timing {
            open_secs: self.open_time,
            close_secs: self.close_time,
            obstruction_detection: self.obstruction_detection,
        }
    }
}

// ---------------------------------------------------------------------------
// Transport tuning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportConfig {
    /// TCP port used when the hostname carries none.
    pub port: u16,
    /// WebSocket RPC path on the device.
    pub path: String,
    /// TCP connect + handshake timeout (milliseconds).
    pub connect_timeout_ms: u64,
    /// Read timeout of an open link; paces the I/O loop (milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: 80,
            path: "/rpc".to_string(),
            connect_timeout_ms: 5000,
            poll_interval_ms: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Reply watchdog tuning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatchdogConfig {
    /// Seconds to wait for a status reply before re-polling. 0 disables.
    pub reply_timeout_secs: u32,
    /// Re-polls after the first unanswered get-status.
    pub max_status_retries: u8,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: 10,
            max_status_retries: 2,
        }
    }
}

impl WatchdogConfig {
    pub fn enabled(&self) -> bool {
        self.reply_timeout_secs > 0
    }
}

// ---------------------------------------------------------------------------
// Whole document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub devices: Vec<DeviceConfig>,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub watchdog: WatchdogConfig,
}

impl GatewayConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| {
            log::error!("Config: parse error at line {} column {}: {}", e.line(), e.column(), e);
            ConfigError::Parse
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::ValidationFailed("no devices configured"));
        }
        for (i, device) in self.devices.iter().enumerate() {
            device.validate()?;
            if self.devices[..i].iter().any(|d| d.id == device.id) {
                return Err(ConfigError::ValidationFailed("duplicate device id"));
            }
        }
        if self.transport.path.is_empty() || !self.transport.path.starts_with('/') {
            return Err(ConfigError::ValidationFailed("transport path must start with '/'"));
        }
        if self.transport.connect_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("connectTimeoutMs must be > 0"));
        }
        if self.transport.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("pollIntervalMs must be > 0"));
        }
        Ok(())
    }
}

/// Returns `true` if every byte of `s` is in the printable ASCII range.
fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}
