//! Event handlers of the reconciliation engine.
//!
//! One plain `fn` per engine event.  Each reads the *live* context (never
//! a captured snapshot), so a reply arriving after a newer set request
//! cannot stomp the newer target.

use log::{debug, info, warn};

use super::context::{Action, Actions, GateContext, Published};
use super::{DoorState, TargetState, Timing};

// ═══════════════════════════════════════════════════════════════════════════
//  SetRequest
// ═══════════════════════════════════════════════════════════════════════════

/// A UI request to move the gate toward `target`.
pub fn set_request(ctx: &mut GateContext, timing: &Timing, target: TargetState) -> Actions {
    let mut actions = Actions::new();

    let Some(last) = ctx.last_state else {
        warn!("Gate: set {} while state is unknown, requesting status", target);
        actions.push(Action::RequestStatus);
        return actions;
    };

    info!("Gate: set {} (last {})", target, last);
    match (last, target) {
        (DoorState::Closed, TargetState::Open)
        | (DoorState::Open, TargetState::Closed)
        | (DoorState::Stopped, _) => begin_travel(ctx, timing, target, &mut actions),

        (DoorState::Opening | DoorState::Closing, _) => {
            actions.push(Action::TriggerSwitch);
            ctx.last_state = Some(DoorState::Stopped);
            actions.push(Action::CancelCheck);
            actions.publish(Published::CurrentState(DoorState::Stopped));
        }

        (DoorState::Open, TargetState::Open) | (DoorState::Closed, TargetState::Closed) => {
            warn!("Gate: already {}", last);
            if let Some(current) = ctx.current_state.and_then(TargetState::from_door) {
                ctx.target_state = Some(current);
                actions.publish(Published::TargetState(current));
            }
        }
    }
    actions
}

fn begin_travel(ctx: &mut GateContext, timing: &Timing, target: TargetState, actions: &mut Actions) {
    let travel = target.travel_state();
    let after_secs = timing.travel_secs(target);
    debug!("Gate: {} for {}s", travel, after_secs);

    actions.push(Action::TriggerSwitch);
    ctx.target_state = Some(target);
    ctx.last_state = Some(travel);
    actions.publish(Published::TargetState(target));
    actions.publish(Published::CurrentState(travel));
    actions.push(Action::ArmCheck { after_secs });
}

// ═══════════════════════════════════════════════════════════════════════════
//  StatusReply
// ═══════════════════════════════════════════════════════════════════════════

/// A get-status reply carrying the contact reading.
pub fn status_reply(ctx: &mut GateContext, timing: &Timing, sensor_open: bool) -> Actions {
    let mut actions = Actions::new();
    let reading = DoorState::from_contact(sensor_open);

    if !ctx.is_initialized() {
        initialize(ctx, reading, &mut actions);
        return actions;
    }

    ctx.current_state = Some(reading);

    if ctx.is(DoorState::Opening, TargetState::Open) {
        actions.push(Action::CancelCheck);
        if reading == DoorState::Open {
            info!("Gate: opened");
            ctx.last_state = Some(DoorState::Open);
            actions.publish(Published::CurrentState(DoorState::Open));
        } else {
            warn!("Gate: should be open but still reads closed");
            raise_obstruction(ctx, timing, &mut actions);
            ctx.last_state = Some(DoorState::Closed);
            ctx.target_state = Some(TargetState::Closed);
            actions.publish(Published::TargetState(TargetState::Closed));
            actions.publish(Published::CurrentState(DoorState::Closed));
        }
    } else if ctx.is(DoorState::Closing, TargetState::Closed) {
        if reading == DoorState::Closed {
            info!("Gate: closed");
            actions.push(Action::CancelCheck);
            ctx.last_state = Some(DoorState::Closed);
            actions.publish(Published::CurrentState(DoorState::Closed));
            clear_obstruction(ctx, &mut actions);
        } else {
            warn!(
                "Gate: should be closed by now, consider a longer closeTime than {}s",
                timing.close_secs
            );
            raise_obstruction(ctx, timing, &mut actions);
            actions.push(Action::ArmCheck { after_secs: timing.close_secs });
        }
    } else if ctx.last_state == ctx.target_state.map(DoorState::from) {
        debug!("Gate: settled, refreshing from reading {}", reading);
        ctx.last_state = Some(reading);
        let target = TargetState::from_door(reading);
        ctx.target_state = target;
        actions.publish(Published::CurrentState(reading));
        if let Some(target) = target {
            actions.publish(Published::TargetState(target));
        }
    } else {
        debug!(
            "Gate: status {} ignored in {:?}/{:?}",
            reading, ctx.last_state, ctx.target_state
        );
    }
    actions
}

/// First reading after creation.  Only unset fields are filled; set
/// fields are never cleared again.
fn initialize(ctx: &mut GateContext, reading: DoorState, actions: &mut Actions) {
    info!("Gate: initial state {}", reading);
    ctx.current_state = Some(reading);

    if ctx.last_state.is_none() || ctx.target_state.is_none() {
        ctx.last_state = Some(reading);
        ctx.target_state = TargetState::from_door(reading);
    }
    if ctx.obstruction_detected.is_none() {
        ctx.obstruction_detected = Some(false);
    }

    if let Some(last) = ctx.last_state {
        actions.publish(Published::CurrentState(last));
    }
    if let Some(target) = ctx.target_state {
        actions.publish(Published::TargetState(target));
    }
    actions.publish(Published::Obstruction(ctx.obstruction_detected.unwrap_or(false)));
}

// ═══════════════════════════════════════════════════════════════════════════
//  Notification
// ═══════════════════════════════════════════════════════════════════════════

/// An unsolicited contact change.  Closed is authoritative.
pub fn notification(ctx: &mut GateContext, timing: &Timing, sensor_open: bool) -> Actions {
    let mut actions = Actions::new();

    if sensor_open {
        ctx.current_state = Some(DoorState::Open);
        if ctx.is(DoorState::Opening, TargetState::Open) {
            debug!("Gate: opening");
        } else {
            warn!("Gate: opened by another controller");
            ctx.last_state = Some(DoorState::Open);
            ctx.target_state = Some(TargetState::Open);
            actions.push(Action::CancelCheck);
            actions.publish(Published::TargetState(TargetState::Open));
            actions.publish(Published::CurrentState(DoorState::Open));
        }
        return actions;
    }

    ctx.current_state = Some(DoorState::Closed);
    if ctx.is(DoorState::Closing, TargetState::Closed) {
        info!("Gate: closed");
        clear_obstruction(ctx, &mut actions);
    } else if ctx.is(DoorState::Opening, TargetState::Open) {
        warn!("Gate: closed while opening");
        raise_obstruction(ctx, timing, &mut actions);
    } else {
        info!("Gate: closed by another controller");
    }
    ctx.last_state = Some(DoorState::Closed);
    ctx.target_state = Some(TargetState::Closed);
    actions.push(Action::CancelCheck);
    actions.publish(Published::TargetState(TargetState::Closed));
    actions.publish(Published::CurrentState(DoorState::Closed));
    actions
}

// ═══════════════════════════════════════════════════════════════════════════
//  Deferred check / resume
// ═══════════════════════════════════════════════════════════════════════════

/// The settle check fired: re-poll, change nothing until the reply.
pub fn check_due(ctx: &GateContext) -> Actions {
    debug!("Gate: settle check due in {:?}", ctx.last_state);
    let mut actions = Actions::new();
    actions.push(Action::RequestStatus);
    actions
}

/// Settle check for a context that starts out mid-transition.
pub fn resume(ctx: &GateContext, timing: &Timing) -> Actions {
    let mut actions = Actions::new();
    let after_secs = match ctx.last_state {
        Some(DoorState::Opening) => timing.open_secs,
        Some(DoorState::Closing) => timing.close_secs,
        _ => return actions,
    };
    info!("Gate: resuming {:?}, check in {}s", ctx.last_state, after_secs);
    actions.push(Action::ArmCheck { after_secs });
    actions
}

// ───────────────────────────────────────────────────────────────
// Obstruction flag
// ───────────────────────────────────────────────────────────────

fn raise_obstruction(ctx: &mut GateContext, timing: &Timing, actions: &mut Actions) {
    if !timing.obstruction_detection {
        return;
    }
    ctx.obstruction_detected = Some(true);
    actions.publish(Published::Obstruction(true));
}

fn clear_obstruction(ctx: &mut GateContext, actions: &mut Actions) {
    ctx.obstruction_detected = Some(false);
    actions.publish(Published::Obstruction(false));
}
