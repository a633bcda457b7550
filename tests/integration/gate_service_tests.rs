//! Integration tests for the GateService → Reconciler → ports pipeline.
//!
//! Drives the service with decoded frames and an explicit clock, then
//! checks the requests it queued and the values it published.

use crate::mock_ports::{
    MockCommandPort, RecordingSink, context, device, input_notification, status_frame,
};

use drivegate::app::commands::GateCommand;
use drivegate::app::events::AppEvent;
use drivegate::app::service::GateService;
use drivegate::config::WatchdogConfig;
use drivegate::fsm::{DoorState, GateContext, TargetState};
use drivegate::rpc::codec::{Method, decode};
use drivegate::scheduler::{CheckKey, CheckKind};

fn settle_key() -> CheckKey {
    CheckKey::new("gate-1".try_into().unwrap(), CheckKind::Settle)
}

fn make_service(ctx: GateContext) -> (GateService, MockCommandPort, RecordingSink) {
    let svc = GateService::new(&device(), WatchdogConfig::default(), ctx).unwrap();
    (svc, MockCommandPort::new(), RecordingSink::new())
}

// ── Opening scenario ──────────────────────────────────────────

#[test]
fn open_from_closed_runs_to_open() {
    let (mut svc, mut port, mut sink) = make_service(context(DoorState::Closed, TargetState::Closed));

    svc.handle_command(GateCommand::SetTarget(TargetState::Open), 1_000, &mut port, &mut sink);
    assert_eq!(port.count(Method::SwitchSet), 1);
    assert_eq!(svc.context().last_state, Some(DoorState::Opening));
    assert!(sink.contains(&AppEvent::CurrentState(DoorState::Opening)));
    assert!(sink.contains(&AppEvent::TargetState(TargetState::Open)));
    assert_eq!(svc.scheduler().due_at(&settle_key()), Some(16_000));

    // Nothing before the deadline.
    assert_eq!(svc.tick(15_999, &mut port, &mut sink), 0);
    assert_eq!(port.count(Method::GetStatus), 0);

    assert_eq!(svc.tick(16_000, &mut port, &mut sink), 1);
    assert_eq!(port.count(Method::GetStatus), 1);
    assert_eq!(svc.context().last_state, Some(DoorState::Opening));

    let id = port.last_id(Method::GetStatus).unwrap();
    svc.handle_message(status_frame(id, true), 16_200, &mut port, &mut sink);
    assert_eq!(svc.context().last_state, Some(DoorState::Open));
    assert_eq!(svc.context().target_state, Some(TargetState::Open));
    assert!(sink.contains(&AppEvent::CurrentState(DoorState::Open)));
    assert!(!svc.scheduler().is_armed(&settle_key()));
    assert_eq!(svc.next_deadline(), None);
}

#[test]
fn failed_open_regresses_and_flags_obstruction_once() {
    let (mut svc, mut port, mut sink) = make_service(context(DoorState::Opening, TargetState::Open));

    svc.handle_message(status_frame(1, false), 0, &mut port, &mut sink);
    assert_eq!(svc.context().last_state, Some(DoorState::Closed));
    assert_eq!(svc.context().target_state, Some(TargetState::Closed));
    assert_eq!(svc.context().obstruction_detected, Some(true));

    // A later reply that matches the state does not re-raise the flag.
    svc.handle_message(status_frame(2, false), 100, &mut port, &mut sink);
    assert_eq!(sink.count(&AppEvent::ObstructionDetected(true)), 1);
}

#[test]
fn closing_overrun_raises_and_rechecks() {
    let (mut svc, mut port, mut sink) = make_service(context(DoorState::Closing, TargetState::Closed));

    svc.handle_message(status_frame(1, true), 5_000, &mut port, &mut sink);
    assert_eq!(svc.context().obstruction_detected, Some(true));
    assert_eq!(svc.context().last_state, Some(DoorState::Closing));
    assert_eq!(svc.scheduler().due_at(&settle_key()), Some(25_000));

    svc.handle_message(status_frame(2, false), 26_000, &mut port, &mut sink);
    assert_eq!(svc.context().last_state, Some(DoorState::Closed));
    assert_eq!(svc.context().obstruction_detected, Some(false));
    assert!(!svc.scheduler().is_armed(&settle_key()));
}

// ── Stop / resume ─────────────────────────────────────────────

#[test]
fn set_while_moving_stops_and_cancels_the_check() {
    let (mut svc, mut port, mut sink) = make_service(context(DoorState::Closed, TargetState::Closed));
    svc.handle_command(GateCommand::SetTarget(TargetState::Open), 0, &mut port, &mut sink);

    svc.handle_command(GateCommand::SetTarget(TargetState::Closed), 3_000, &mut port, &mut sink);
    assert_eq!(port.count(Method::SwitchSet), 2);
    assert_eq!(svc.context().last_state, Some(DoorState::Stopped));
    assert!(!svc.scheduler().is_armed(&settle_key()));

    svc.handle_command(GateCommand::SetTarget(TargetState::Closed), 4_000, &mut port, &mut sink);
    assert_eq!(port.count(Method::SwitchSet), 3);
    assert_eq!(svc.context().last_state, Some(DoorState::Closing));
    assert_eq!(svc.scheduler().due_at(&settle_key()), Some(24_000));
}

#[test]
fn start_rearms_a_restored_transition() {
    let (mut svc, mut port, mut sink) = make_service(context(DoorState::Closing, TargetState::Closed));
    svc.start(500, &mut port, &mut sink);

    assert_eq!(port.count(Method::GetDeviceInfo), 1);
    assert_eq!(port.count(Method::GetStatus), 1);
    assert_eq!(svc.scheduler().due_at(&settle_key()), Some(20_500));
}

#[test]
fn settle_check_keeps_polling_until_answered() {
    let (mut svc, mut port, mut sink) = make_service(context(DoorState::Closed, TargetState::Closed));
    svc.handle_command(GateCommand::SetTarget(TargetState::Open), 0, &mut port, &mut sink);

    svc.tick(15_000, &mut port, &mut sink);
    assert!(svc.context().is_transitional());
    assert_eq!(svc.scheduler().due_at(&settle_key()), Some(30_000));
}

// ── Notifications ─────────────────────────────────────────────

#[test]
fn closed_notification_is_authoritative() {
    let (mut svc, mut port, mut sink) = make_service(context(DoorState::Opening, TargetState::Open));

    svc.handle_message(input_notification(false), 2_000, &mut port, &mut sink);
    assert_eq!(svc.context().last_state, Some(DoorState::Closed));
    assert_eq!(svc.context().target_state, Some(TargetState::Closed));
    assert_eq!(svc.context().obstruction_detected, Some(true));
    assert_eq!(svc.next_deadline(), None);
}

#[test]
fn open_notification_from_elsewhere_publishes_open() {
    let (mut svc, mut port, mut sink) = make_service(context(DoorState::Closed, TargetState::Closed));

    svc.handle_message(input_notification(true), 0, &mut port, &mut sink);
    assert!(svc.context().is(DoorState::Open, TargetState::Open));
    assert!(sink.contains(&AppEvent::CurrentState(DoorState::Open)));
    assert!(port.sent.is_empty());
}

// ── Initialization ────────────────────────────────────────────

#[test]
fn first_reply_initializes_the_context() {
    let (mut svc, mut port, mut sink) = make_service(GateContext::default());
    svc.start(0, &mut port, &mut sink);
    let id = port.last_id(Method::GetStatus).unwrap();

    svc.handle_message(status_frame(id, true), 50, &mut port, &mut sink);
    assert!(svc.context().is(DoorState::Open, TargetState::Open));
    assert_eq!(svc.context().obstruction_detected, Some(false));
    assert!(sink.contains(&AppEvent::ObstructionDetected(false)));
    // The reply also disarmed the watchdog.
    assert_eq!(svc.next_deadline(), None);
}

#[test]
fn set_before_initialization_requests_status() {
    let (mut svc, mut port, mut sink) = make_service(GateContext::default());
    svc.handle_command(GateCommand::SetTarget(TargetState::Open), 0, &mut port, &mut sink);

    assert_eq!(port.count(Method::SwitchSet), 0);
    assert_eq!(port.count(Method::GetStatus), 1);
    assert_eq!(svc.context().last_state, None);
}

// ── Other replies ─────────────────────────────────────────────

#[test]
fn device_info_reply_publishes_accessory_info() {
    let (mut svc, mut port, mut sink) = make_service(context(DoorState::Closed, TargetState::Closed));
    let msg = decode(
        r#"{"id":1,"src":"shellyplus1-a8032ab12345","result":{"name":null,"id":"shellyplus1-a8032ab12345","mac":"A8032AB12345","model":"SNSW-001X16EU","gen":2,"fw_id":"20231107-164738/1.0.8-g","ver":"1.0.8","app":"Plus1"}}"#,
    )
    .unwrap();

    svc.handle_message(msg, 0, &mut port, &mut sink);
    let info = svc.accessory_info().unwrap();
    assert_eq!(info.manufacturer, "Shelly");
    assert_eq!(info.serial_number, "A8032AB12345");
    assert_eq!(info.firmware_revision, "1.0.8");
    assert_eq!(info.name, "Driveway");
    assert!(matches!(sink.events.last(), Some(AppEvent::AccessoryInfo(_))));
}

#[test]
fn error_reply_leaves_the_context_alone() {
    let before = context(DoorState::Open, TargetState::Open);
    let (mut svc, mut port, mut sink) = make_service(before);
    let msg = decode(r#"{"id":3,"error":{"code":-103,"message":"Resource unavailable"}}"#).unwrap();

    svc.handle_message(msg, 0, &mut port, &mut sink);
    assert_eq!(*svc.context(), before);
    assert!(sink.events.is_empty());
}

#[test]
fn switch_traffic_while_opening_changes_nothing() {
    let (mut svc, mut port, mut sink) = make_service(context(DoorState::Closed, TargetState::Closed));
    svc.handle_command(GateCommand::SetTarget(TargetState::Open), 0, &mut port, &mut sink);
    let set_id = port.last_id(Method::SwitchSet).unwrap();
    let before = *svc.context();
    let deadline = svc.next_deadline();
    port.clear();
    sink.clear();

    let switch_only = decode(
        r#"{"src":"shellyplus1-a8032ab12345","dst":"Driveway","method":"NotifyStatus","params":{"ts":1700000001.0,"switch:0":{"id":0,"output":true,"source":"WS_in"}}}"#,
    )
    .unwrap();
    svc.handle_message(switch_only, 100, &mut port, &mut sink);

    let other = decode(r#"{"src":"shellyplus1-a8032ab12345","method":"NotifyEvent","params":{"ts":1700000001.5}}"#).unwrap();
    svc.handle_message(other, 150, &mut port, &mut sink);

    let reply = decode(&format!(r#"{{"id":{set_id},"src":"shellyplus1-a8032ab12345","result":{{"was_on":false}}}}"#)).unwrap();
    svc.handle_message(reply, 200, &mut port, &mut sink);

    assert_eq!(before.last_state, Some(DoorState::Opening));
    assert_eq!(*svc.context(), before);
    assert_eq!(svc.next_deadline(), deadline);
    assert!(sink.events.is_empty());
    assert!(port.sent.is_empty());
}
