//! Inbound commands to the application service.
//!
//! These represent actions requested by the UI layer that the
//! [`GateService`](super::service::GateService) interprets and acts upon.

use crate::fsm::TargetState;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateCommand {
    /// Move the gate toward a stable target (a SetRequest).
    SetTarget(TargetState),

    /// Re-poll the device unless a transition is in progress.
    Refresh,
}
