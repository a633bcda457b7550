//! Application service, the hexagonal core of one gate.
//!
//! [`GateService`] owns the reconciliation engine, the deferred-check
//! scheduler and request correlation for a single device.  All I/O flows
//! through port traits injected at call sites, so the whole service runs
//! against mock adapters in tests.
//!
//! ```text
//!  GateCommand ──▶ ┌──────────────────────────┐ ──▶ CommandPort (requests)
//!                  │       GateService        │
//!  Inbound msg ──▶ │ Reconciler · Scheduler   │ ──▶ EventSink (published)
//!   tick(now) ───▶ │ Correlation · Watchdog   │
//!                  └──────────────────────────┘
//! ```

use log::{debug, error, info, warn};

use crate::config::{ContextId, DeviceConfig, WatchdogConfig};
use crate::error::ConfigError;
use crate::fsm::{Action, Actions, GateContext, Reconciler};
use crate::rpc::codec::{Command, InboundMessage, Method, NotificationKind};
use crate::rpc::correlation::{PendingRequests, RequestIds, Resolution};
use crate::scheduler::{CHECKS_PER_GATE, CheckKey, CheckKind, Scheduler};

use super::commands::GateCommand;
use super::events::{AccessoryInfo, AppEvent};
use super::ports::{CommandPort, EventSink, SchedulerDelegate};

// ───────────────────────────────────────────────────────────────
// Fired-check collector
// ───────────────────────────────────────────────────────────────

/// Collects fired check kinds so they are handled after the scheduler
/// borrow ends.
#[derive(Default)]
struct FiredChecks(heapless::Vec<CheckKind, CHECKS_PER_GATE>);

impl SchedulerDelegate for FiredChecks {
    fn on_check_fired(&mut self, key: &CheckKey) {
        if self.0.push(key.kind).is_err() {
            warn!("Gate[{}]: fired {:?} check dropped, collector full", key.context, key.kind);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// GateService
// ───────────────────────────────────────────────────────────────

pub struct GateService {
    id: ContextId,
    /// Device name; the `src` of every request.
    name: String,
    engine: Reconciler,
    scheduler: Scheduler<CHECKS_PER_GATE>,
    watchdog: WatchdogConfig,
    /// Re-polls issued since the last answered get-status.
    status_retries: u8,
    ids: RequestIds,
    pending: PendingRequests,
    info: Option<AccessoryInfo>,
}

impl GateService {
    /// Build the service around an injected (possibly restored) context.
    ///
    /// Does **not** talk to the device; call [`start`](Self::start) next.
    pub fn new(
        device: &DeviceConfig,
        watchdog: WatchdogConfig,
        context: GateContext,
    ) -> Result<Self, ConfigError> {
        device.validate()?;
        Ok(Self {
            id: device.context_id()?,
            name: device.name.clone(),
            engine: Reconciler::new(context, device.timing()),
            scheduler: Scheduler::new(),
            watchdog,
            status_retries: 0,
            ids: RequestIds::new(),
            pending: PendingRequests::new(),
            info: None,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the service, query identity and status, and re-arm the
    /// settle check of a context restored mid-transition.
    pub fn start(&mut self, now_ms: u64, port: &mut impl CommandPort, sink: &mut impl EventSink) {
        let ctx = *self.engine.context();
        info!("Gate[{}]: started ({:?})", self.id, ctx.last_state);
        sink.emit(&AppEvent::Started(ctx));

        self.send(Method::GetDeviceInfo, port);
        self.request_status(now_ms, port, false);

        let actions = self.engine.resume();
        self.apply(actions, now_ms, port, sink);
    }

    // ── Inputs ────────────────────────────────────────────────

    pub fn handle_command(
        &mut self,
        cmd: GateCommand,
        now_ms: u64,
        port: &mut impl CommandPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            GateCommand::SetTarget(target) => {
                info!("Gate[{}]: set target {}", self.id, target);
                let actions = self.engine.on_set_request(target);
                self.apply(actions, now_ms, port, sink);
            }
            GateCommand::Refresh => {
                if self.engine.context().is_transitional() {
                    debug!("Gate[{}]: refresh skipped while moving", self.id);
                } else {
                    self.request_status(now_ms, port, false);
                }
            }
        }
    }

    /// Route one decoded inbound frame.
    pub fn handle_message(
        &mut self,
        msg: InboundMessage,
        now_ms: u64,
        port: &mut impl CommandPort,
        sink: &mut impl EventSink,
    ) {
        if let Some(id) = msg.reply_id() {
            match self.pending.resolve(id) {
                Resolution::Current(method) => {
                    debug!("Gate[{}]: reply #{} answers {}", self.id, id, method.as_str());
                }
                Resolution::Unknown => {
                    debug!("Gate[{}]: reply #{} matches no outstanding request", self.id, id);
                }
            }
        }

        match msg {
            InboundMessage::Status { sensor_open, .. } => {
                let watchdog = self.check_key(CheckKind::ReplyWatchdog);
                self.scheduler.cancel(&watchdog);
                self.status_retries = 0;
                let actions = self.engine.on_status_reply(sensor_open);
                self.apply(actions, now_ms, port, sink);
            }
            InboundMessage::Notification {
                kind: NotificationKind::Input { sensor_open },
                ..
            } => {
                let actions = self.engine.on_notification(sensor_open);
                self.apply(actions, now_ms, port, sink);
            }
            InboundMessage::Notification { method, kind, .. } => {
                debug!("Gate[{}]: ignored {} ({:?})", self.id, method, kind);
            }
            InboundMessage::DeviceInfo { info, .. } => {
                let accessory = AccessoryInfo::from_device_info(&info, &self.name);
                info!(
                    "Gate[{}]: {} {} fw {}",
                    self.id, accessory.model, accessory.serial_number, accessory.firmware_revision
                );
                sink.emit(&AppEvent::AccessoryInfo(accessory.clone()));
                self.info = Some(accessory);
            }
            InboundMessage::SwitchSet { id, was_on } => {
                info!("Gate[{}]: switch #{} triggered (was_on={})", self.id, id, was_on);
            }
            InboundMessage::RpcError { id, code, message } => {
                warn!("Gate[{}]: request #{} failed: {} ({})", self.id, id, message, code);
            }
        }
    }

    /// Fire every check due at `now_ms`.  Returns how many fired.
    pub fn tick(&mut self, now_ms: u64, port: &mut impl CommandPort, sink: &mut impl EventSink) -> usize {
        let mut fired = FiredChecks::default();
        let count = self.scheduler.tick(now_ms, &mut fired);

        for kind in fired.0 {
            match kind {
                CheckKind::Settle => self.on_settle_due(now_ms, port, sink),
                CheckKind::ReplyWatchdog => self.on_reply_overdue(now_ms, port, sink),
            }
        }
        count
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &GateContext {
        self.engine.context()
    }

    pub fn accessory_info(&self) -> Option<&AccessoryInfo> {
        self.info.as_ref()
    }

    /// Earliest monotonic deadline the caller must wake up for.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    pub fn scheduler(&self) -> &Scheduler<CHECKS_PER_GATE> {
        &self.scheduler
    }

    pub fn status_retries(&self) -> u8 {
        self.status_retries
    }

    // ── Internal ──────────────────────────────────────────────

    fn check_key(&self, kind: CheckKind) -> CheckKey {
        CheckKey::new(self.id.clone(), kind)
    }

    fn on_settle_due(&mut self, now_ms: u64, port: &mut impl CommandPort, sink: &mut impl EventSink) {
        let actions = self.engine.on_check_due();
        self.apply(actions, now_ms, port, sink);

        // Keep polling until a reply settles the transition.
        let ctx = *self.engine.context();
        let travel_secs = match ctx.target_state {
            Some(target) if ctx.is_transitional() => self.engine.timing().travel_secs(target),
            _ => return,
        };
        let key = self.check_key(CheckKind::Settle);
        if !self.scheduler.is_armed(&key) {
            self.scheduler.arm(key, secs_to_ms(travel_secs), now_ms);
        }
    }

    fn on_reply_overdue(&mut self, now_ms: u64, port: &mut impl CommandPort, sink: &mut impl EventSink) {
        if self.status_retries < self.watchdog.max_status_retries {
            self.status_retries += 1;
            warn!(
                "Gate[{}]: no status reply, retry {}/{}",
                self.id, self.status_retries, self.watchdog.max_status_retries
            );
            self.request_status(now_ms, port, true);
            return;
        }
        error!(
            "Gate[{}]: device unresponsive after {} status retries, state may be stale",
            self.id, self.status_retries
        );
        self.status_retries = 0;
        sink.emit(&AppEvent::StatusStale);
    }

    /// Perform the engine's requested side effects in order.
    fn apply(&mut self, actions: Actions, now_ms: u64, port: &mut impl CommandPort, sink: &mut impl EventSink) {
        for action in actions {
            match action {
                Action::RequestStatus => self.request_status(now_ms, port, false),
                Action::TriggerSwitch => {
                    self.send(Method::SwitchSet, port);
                }
                Action::Publish(value) => sink.emit(&AppEvent::from(value)),
                Action::ArmCheck { after_secs } => {
                    let key = self.check_key(CheckKind::Settle);
                    self.scheduler.arm(key, secs_to_ms(after_secs), now_ms);
                }
                Action::CancelCheck => {
                    let key = self.check_key(CheckKind::Settle);
                    self.scheduler.cancel(&key);
                }
            }
        }
    }

    /// Issue get-status and arm the reply watchdog.  A fresh request
    /// (not a retry) resets the retry budget.
    fn request_status(&mut self, now_ms: u64, port: &mut impl CommandPort, retry: bool) {
        if !retry {
            self.status_retries = 0;
        }
        if self.send(Method::GetStatus, port) && self.watchdog.enabled() {
            let key = self.check_key(CheckKind::ReplyWatchdog);
            self.scheduler
                .arm(key, secs_to_ms(self.watchdog.reply_timeout_secs), now_ms);
        }
    }

    /// Queue one request.  Returns `false` if it was dropped.
    fn send(&mut self, method: Method, port: &mut impl CommandPort) -> bool {
        let id = self.ids.next_id();
        let cmd = Command {
            id,
            src: self.name.clone(),
            method,
        };
        match port.send(&cmd) {
            Ok(()) => {
                self.pending.track(method, id);
                debug!("Gate[{}]: sent {} #{}", self.id, method.as_str(), id);
                true
            }
            Err(e) => {
                warn!("Gate[{}]: {} #{} dropped: {}", self.id, method.as_str(), id, e);
                false
            }
        }
    }
}

fn secs_to_ms(secs: u32) -> u64 {
    u64::from(secs) * 1000
}
