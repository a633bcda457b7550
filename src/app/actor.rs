//! Per-device runtime: one actor thread plus one I/O thread.
//!
//! The actor owns the [`GateService`] and is the only place a gate's
//! context is mutated.  It runs on an `edge_executor::LocalExecutor` and
//! waits on whichever comes first: the next event from the gate's queue
//! or an `async_io_mini` timer set to the scheduler's next deadline.
//!
//! ```text
//!  ┌───────────────┐ GateEvent ┌──────────────────────────────────┐
//!  │  GateHandle   │──────────▶│  actor thread "gate-<id>"        │
//!  └───────────────┘           │  LocalExecutor                   │
//!  ┌───────────────┐ GateEvent │   or(events.receive(), Timer)    │
//!  │  I/O thread   │──────────▶│   └──▶ GateService               │
//!  │  "io-<id>"    │◀──────────│        └──▶ QueueCommandPort     │
//!  └───────────────┘  Outbound └──────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, error, info};

use crate::adapters::command_queue::QueueCommandPort;
use crate::adapters::snapshot_sink::SnapshotSink;
use crate::adapters::time::MonotonicClock;
use crate::config::{DeviceConfig, WatchdogConfig};
use crate::error::Error;
use crate::events::{GateEvent, drain_events, push_event};
use crate::fsm::GateContext;
use crate::rpc::channels::{OutboundMsg, OutboundQueue};
use crate::rpc::codec::DecodingHandler;
use crate::rpc::io_task;
use crate::rpc::transport::{Connector, Session};

use super::handle::{GateHandle, GateShared};
use super::ports::{ClockPort, EventSink};
use super::service::GateService;

// ───────────────────────────────────────────────────────────────
// Actor
// ───────────────────────────────────────────────────────────────

struct GateActor<S: EventSink> {
    service: GateService,
    shared: Arc<GateShared>,
    port: QueueCommandPort,
    sink: SnapshotSink<S>,
    clock: MonotonicClock,
}

impl<S: EventSink> GateActor<S> {
    async fn run(mut self) {
        let now = self.clock.now_ms();
        self.service.start(now, &mut self.port, &mut self.sink);

        loop {
            let event = match self.service.next_deadline() {
                Some(deadline) => {
                    let wait = deadline.saturating_sub(self.clock.now_ms());
                    futures_lite::future::or(async { Some(self.shared.events().receive().await) }, async {
                        async_io_mini::Timer::after(Duration::from_millis(wait)).await;
                        None
                    })
                    .await
                }
                None => Some(self.shared.events().receive().await),
            };

            let now = self.clock.now_ms();
            match event {
                Some(GateEvent::Shutdown) => break,
                Some(GateEvent::Command(cmd)) => {
                    self.service.handle_command(cmd, now, &mut self.port, &mut self.sink);
                }
                Some(GateEvent::Message(msg)) => {
                    self.service.handle_message(msg, now, &mut self.port, &mut self.sink);
                }
                None => {}
            }
            self.service.tick(now, &mut self.port, &mut self.sink);
        }
        drain_events(self.shared.events(), |event| {
            debug!("Gate[{}]: discarded {:?} at shutdown", self.service.id(), event);
        });
        info!("Gate[{}]: actor stopped", self.service.id());
    }
}

// ───────────────────────────────────────────────────────────────
// Runtime
// ───────────────────────────────────────────────────────────────

/// A running gate.  Dropping it shuts both threads down.
pub struct GateRuntime {
    shared: Arc<GateShared>,
    outbound: Arc<OutboundQueue>,
    actor: Option<JoinHandle<()>>,
    io: Option<JoinHandle<()>>,
}

impl GateRuntime {
    pub fn handle(&self) -> GateHandle {
        GateHandle::new(self.shared.clone())
    }

    pub fn id(&self) -> &str {
        self.shared.id()
    }

    /// Stop the actor, then the I/O thread, and wait for both.
    pub fn shutdown(&mut self) {
        if let Some(actor) = self.actor.take() {
            futures_lite::future::block_on(self.shared.events().send(GateEvent::Shutdown));
            if actor.join().is_err() {
                error!("Gate[{}]: actor thread panicked", self.shared.id());
            }
        }
        if let Some(io) = self.io.take() {
            futures_lite::future::block_on(self.outbound.send(OutboundMsg::Shutdown));
            if io.join().is_err() {
                error!("Gate[{}]: I/O thread panicked", self.shared.id());
            }
        }
    }
}

impl Drop for GateRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start one gate: validate its configuration, spawn the I/O thread
/// around `connector` and the actor thread around the service.
pub fn spawn_gate<C, S>(
    device: &DeviceConfig,
    watchdog: WatchdogConfig,
    connector: C,
    context: GateContext,
    sink: S,
) -> Result<GateRuntime, Error>
where
    C: Connector + Send + 'static,
    S: EventSink + Send + 'static,
{
    let service = GateService::new(device, watchdog, context)?;
    let shared = Arc::new(GateShared::new(device.id.clone()));
    let outbound = Arc::new(OutboundQueue::new());

    let label = device.id.clone();
    let io_shared = shared.clone();
    let handler = DecodingHandler::new(label.clone(), move |msg| {
        push_event(io_shared.events(), GateEvent::Message(msg));
    });
    let session = Session::new(label.clone(), connector);
    let io = io_task::spawn(label.clone(), session, outbound.clone(), handler)
        .map_err(|_| Error::Spawn("I/O thread"))?;

    let mut runtime = GateRuntime {
        shared: shared.clone(),
        outbound: outbound.clone(),
        actor: None,
        io: Some(io),
    };

    let actor = GateActor {
        service,
        shared: shared.clone(),
        port: QueueCommandPort::new(outbound),
        sink: SnapshotSink::new(shared, sink),
        clock: MonotonicClock::new(),
    };
    // On failure `runtime` drops here and stops the I/O thread.
    let handle = std::thread::Builder::new()
        .name(format!("gate-{label}"))
        .spawn(move || {
            let executor: edge_executor::LocalExecutor<'_, 1> = edge_executor::LocalExecutor::new();
            futures_lite::future::block_on(executor.run(actor.run()));
        })
        .map_err(|_| Error::Spawn("actor thread"))?;
    runtime.actor = Some(handle);

    info!("Gate[{}]: runtime up", label);
    Ok(runtime)
}
