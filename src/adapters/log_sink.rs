//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing published gate values to the
//! `log` facade.  The binary chains it behind the snapshot sink so every
//! characteristic update shows up on the console.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] of one gate.
pub struct LogEventSink {
    label: String,
}

impl LogEventSink {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::CurrentState(state) => {
                info!("STATE | {} | {}", self.label, state);
            }
            AppEvent::TargetState(target) => {
                info!("TARGET | {} | {}", self.label, target);
            }
            AppEvent::ObstructionDetected(flag) => {
                info!("OBSTRUCTION | {} | {}", self.label, flag);
            }
            AppEvent::AccessoryInfo(i) => {
                info!(
                    "INFO | {} | {} {} | serial={} fw={}",
                    self.label, i.manufacturer, i.model, i.serial_number, i.firmware_revision
                );
            }
            AppEvent::Started(ctx) => {
                info!(
                    "START | {} | last={:?} target={:?}",
                    self.label, ctx.last_state, ctx.target_state
                );
            }
            AppEvent::StatusStale => {
                warn!("STALE | {} | device not answering", self.label);
            }
        }
    }
}
