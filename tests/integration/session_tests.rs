//! Integration tests for Session → DecodingHandler against the scripted
//! relay.

use crate::scripted_device::ScriptedDevice;

use drivegate::error::ConnectionError;
use drivegate::rpc::codec::{Command, DecodingHandler, InboundMessage, Method, encode};
use drivegate::rpc::transport::{Session, SessionState};

fn frame(id: u32, method: Method) -> String {
    encode(&Command {
        id,
        src: "Driveway".into(),
        method,
    })
    .unwrap()
}

/// Poll until one message is decoded (bounded).
fn poll_one(session: &mut Session<ScriptedDevice>) -> Option<InboundMessage> {
    let mut got = None;
    let mut handler = DecodingHandler::new("test", |msg| got = Some(msg));
    for _ in 0..50 {
        if session.poll(&mut handler).unwrap() {
            break;
        }
    }
    drop(handler);
    got
}

#[test]
fn status_request_is_answered_and_decoded() {
    let device = ScriptedDevice::new(true);
    let mut session = Session::new("gate-1", device.clone());

    session.send(&frame(7, Method::GetStatus)).unwrap();
    let reply = poll_one(&mut session).unwrap();
    assert!(matches!(
        reply,
        InboundMessage::Status {
            id: 7,
            sensor_open: true
        }
    ));
}

#[test]
fn drop_during_send_fails_then_next_send_reopens() {
    let device = ScriptedDevice::new(false);
    let mut session = Session::new("gate-1", device.clone());
    session.send(&frame(1, Method::GetStatus)).unwrap();
    assert!(poll_one(&mut session).is_some());

    device.with(|s| s.drop_next_write = true);
    assert_eq!(session.send(&frame(2, Method::SwitchSet)), Err(ConnectionError::Write));
    assert_eq!(session.state(), SessionState::Closed);

    session.send(&frame(3, Method::SwitchSet)).unwrap();
    assert!(session.is_open());
    assert_eq!(device.with(|s| s.connects), 2);
    assert_eq!(device.count("Switch.Set"), 1);
    assert!(matches!(
        poll_one(&mut session),
        Some(InboundMessage::SwitchSet { id: 3, was_on: false })
    ));
}

#[test]
fn refused_connect_surfaces_then_recovers() {
    let device = ScriptedDevice::new(false);
    device.with(|s| s.refuse_connects = 1);
    let mut session = Session::new("gate-1", device.clone());

    assert_eq!(session.send(&frame(1, Method::GetDeviceInfo)), Err(ConnectionError::Connect));
    session.send(&frame(2, Method::GetDeviceInfo)).unwrap();
    let Some(InboundMessage::DeviceInfo { id, info }) = poll_one(&mut session) else {
        panic!("expected device info");
    };
    assert_eq!(id, 2);
    assert_eq!(info.mac, "AABBCCDDEEFF");
    assert_eq!(info.generation, 2);
}

#[test]
fn notifications_arrive_without_a_request() {
    let device = ScriptedDevice::new(false);
    let mut session = Session::new("gate-1", device.clone());
    session.ensure_connected().unwrap();

    device.notify_input(true);
    let Some(InboundMessage::Notification { method, kind, .. }) = poll_one(&mut session) else {
        panic!("expected a notification");
    };
    assert_eq!(method, "NotifyStatus");
    assert_eq!(
        kind,
        drivegate::rpc::codec::NotificationKind::Input { sensor_open: true }
    );
}
