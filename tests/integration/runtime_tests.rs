//! End-to-end: GateRuntime threads + scripted relay + GateHandle.

use std::time::{Duration, Instant};

use crate::mock_ports::{RecordingSink, device};
use crate::scripted_device::ScriptedDevice;

use drivegate::app::actor::spawn_gate;
use drivegate::config::WatchdogConfig;
use drivegate::fsm::{DoorState, GateContext};

/// Poll `cond` every 10 ms for up to 3 s.
fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    cond()
}

#[test]
fn runtime_initializes_opens_and_shuts_down() {
    let relay = ScriptedDevice::new(false);
    let mut runtime = spawn_gate(
        &device(),
        WatchdogConfig::default(),
        relay.clone(),
        GateContext::default(),
        RecordingSink::new(),
    )
    .unwrap();
    let handle = runtime.handle();

    assert!(wait_for(|| handle.get_current_state() == Some(DoorState::Closed)));
    assert_eq!(handle.get_target_state(), Some(DoorState::Closed));
    assert!(!handle.get_obstruction_detected());
    assert!(wait_for(|| handle.accessory_info().is_some()));
    assert_eq!(handle.accessory_info().unwrap().name, "Gate relay");

    assert!(!handle.set_target_state(DoorState::Stopped));
    assert!(handle.set_target_state(DoorState::Open));
    assert!(wait_for(|| handle.get_current_state() == Some(DoorState::Opening)));
    assert_eq!(handle.get_target_state(), Some(DoorState::Open));
    assert!(wait_for(|| relay.count("Switch.Set") == 1));

    // Someone closes the gate by hand mid-travel.
    relay.notify_input(false);
    assert!(wait_for(|| handle.get_current_state() == Some(DoorState::Closed)));
    assert!(handle.get_obstruction_detected());

    runtime.shutdown();
    assert_eq!(relay.with(|s| s.connects), 1);
}

#[test]
fn refresh_repolls_the_device() {
    let relay = ScriptedDevice::new(true);
    let runtime = spawn_gate(
        &device(),
        WatchdogConfig::default(),
        relay.clone(),
        GateContext::default(),
        RecordingSink::new(),
    )
    .unwrap();
    let handle = runtime.handle();
    assert!(wait_for(|| handle.get_current_state() == Some(DoorState::Open)));
    let polls = relay.count("Shelly.GetStatus");

    assert!(handle.refresh());
    assert!(wait_for(|| relay.count("Shelly.GetStatus") == polls + 1));
    // Dropping the runtime stops both threads.
    drop(runtime);
}

#[test]
fn settle_timer_repolls_without_a_notification() {
    let relay = ScriptedDevice::new(false);
    let mut gate = device();
    gate.open_time = 1;
    let runtime = spawn_gate(
        &gate,
        WatchdogConfig::default(),
        relay.clone(),
        GateContext::default(),
        RecordingSink::new(),
    )
    .unwrap();
    let handle = runtime.handle();
    assert!(wait_for(|| handle.get_current_state() == Some(DoorState::Closed)));
    let polls = relay.count("Shelly.GetStatus");

    assert!(handle.set_target_state(DoorState::Open));
    assert!(wait_for(|| relay.count("Switch.Set") == 1));
    // The gate reaches its end stop silently; only the settle re-poll can see it.
    relay.with(|s| s.sensor_open = true);

    assert!(wait_for(|| handle.get_current_state() == Some(DoorState::Open)));
    assert!(relay.count("Shelly.GetStatus") > polls);
    assert_eq!(handle.get_target_state(), Some(DoorState::Open));
}
