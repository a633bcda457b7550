//! Fuzz target: reconciliation engine
//!
//! Interprets each input byte as one engine event and checks that an
//! initialized context stays initialized and that the action buffer
//! never overflows.
//!
//! cargo fuzz run fuzz_engine_inputs

#![no_main]

use drivegate::fsm::{DoorState, GateContext, Reconciler, TargetState, Timing};
use drivegate::fsm::context::MAX_ACTIONS;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let ctx = GateContext {
        current_state: Some(DoorState::Closed),
        last_state: Some(DoorState::Closed),
        target_state: Some(TargetState::Closed),
        obstruction_detected: Some(false),
    };
    let timing = Timing {
        open_secs: 15,
        close_secs: 20,
        obstruction_detection: true,
    };
    let mut engine = Reconciler::new(ctx, timing);

    for byte in data {
        let flag = byte & 0x10 != 0;
        let actions = match byte % 4 {
            0 => engine.on_set_request(if flag { TargetState::Open } else { TargetState::Closed }),
            1 => engine.on_status_reply(flag),
            2 => engine.on_notification(flag),
            _ => engine.on_check_due(),
        };
        assert!(actions.len() <= MAX_ACTIONS);
        assert!(engine.context().is_initialized());
    }
});
