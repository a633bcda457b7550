//! Transport session: one persistent text-frame connection to a fixed
//! endpoint, re-opened on demand.
//!
//! Concrete links:
//! - WebSocket over TCP (`adapters::ws_transport`)
//! - scripted in-memory links in the test suite
//!
//! ```text
//!   CLOSED ──ensure_connected()──▶ CONNECTING ──ok──▶ OPEN
//!     ▲                                 │               │
//!     ├───────────── err ───────────────┘               │
//!     ├──────────── I/O error / peer close ─────────────┤
//!     └───────── CLOSING ◀──────── close() ─────────────┘
//! ```
//!
//! The session is owned by exactly one I/O thread and every attempt runs
//! under `&mut self`, so at most one connect is ever in flight; a send
//! issued meanwhile simply queues behind it.  A dropped link is detached
//! and left closed: nothing reconnects until the next send.

use log::{debug, info, warn};

use crate::error::ConnectionError;

/// A connected, message-oriented link.
pub trait Link: Send {
    /// Write one text frame.
    fn send_text(&mut self, text: &str) -> Result<(), ConnectionError>;

    /// Wait up to the link's poll interval for one text frame.
    /// `Ok(None)` means nothing arrived in time.
    fn recv_text(&mut self) -> Result<Option<String>, ConnectionError>;

    /// Best-effort graceful close.
    fn close(&mut self);
}

/// Opens links to one endpoint.
pub trait Connector {
    type Link: Link;

    /// Open a new link and block until it is usable or failed.
    fn connect(&mut self) -> Result<Self::Link, ConnectionError>;

    /// Human-readable endpoint (for logs).
    fn endpoint(&self) -> &str;
}

/// Receives every inbound text frame, one call per frame.
pub trait FrameHandler {
    fn on_frame(&mut self, text: &str);
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// The transport session.
pub struct Session<C: Connector> {
    connector: C,
    link: Option<C::Link>,
    state: SessionState,
    label: String,
}

impl<C: Connector> Session<C> {
    /// A closed session; nothing is opened until the first send.
    pub fn new(label: impl Into<String>, connector: C) -> Self {
        Self {
            connector,
            link: None,
            state: SessionState::Closed,
            label: label.into(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Return once the link is open, opening a new one if needed.
    pub fn ensure_connected(&mut self) -> Result<(), ConnectionError> {
        match self.state {
            SessionState::Open if self.link.is_some() => return Ok(()),
            SessionState::Open => {
                // Open without a link cannot be produced by this type.
                debug_assert!(false, "open session without link");
            }
            SessionState::Connecting => {
                // Only observable inside `connect()`, which runs under `&mut self`.
                debug!("IO[{}]: previous attempt did not finish", self.label);
            }
            SessionState::Closing | SessionState::Closed => {}
        }

        self.state = SessionState::Connecting;
        info!("IO[{}]: connecting to {}", self.label, self.connector.endpoint());
        match self.connector.connect() {
            Ok(link) => {
                self.link = Some(link);
                self.state = SessionState::Open;
                info!("IO[{}]: connected", self.label);
                Ok(())
            }
            Err(e) => {
                self.link = None;
                self.state = SessionState::Closed;
                warn!("IO[{}]: connect failed: {}", self.label, e);
                Err(e)
            }
        }
    }

    /// Ensure connected, then write one frame.  At-most-once: a failed
    /// write closes the session and is not retried.
    pub fn send(&mut self, text: &str) -> Result<(), ConnectionError> {
        self.ensure_connected()?;
        let link = self.link.as_mut().ok_or(ConnectionError::Closed)?;
        match link.send_text(text) {
            Ok(()) => {
                debug!("IO[{}]: >> {}", self.label, text);
                Ok(())
            }
            Err(e) => {
                warn!("IO[{}]: send failed: {}", self.label, e);
                self.detach();
                Err(e)
            }
        }
    }

    /// Deliver at most one inbound frame to `handler`.
    ///
    /// Returns `Ok(true)` if a frame was delivered.  A closed session
    /// returns `Ok(false)` without touching the network.
    pub fn poll(&mut self, handler: &mut dyn FrameHandler) -> Result<bool, ConnectionError> {
        let Some(link) = self.link.as_mut() else {
            return Ok(false);
        };
        match link.recv_text() {
            Ok(Some(text)) => {
                handler.on_frame(&text);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                if e == ConnectionError::Closed {
                    info!("IO[{}]: peer closed the connection", self.label);
                } else {
                    warn!("IO[{}]: receive failed: {}", self.label, e);
                }
                self.detach();
                Err(e)
            }
        }
    }

    /// Graceful shutdown.
    pub fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            self.state = SessionState::Closing;
            link.close();
            info!("IO[{}]: closed", self.label);
        }
        self.state = SessionState::Closed;
    }

    /// Drop the link after an unexpected failure.
    fn detach(&mut self) {
        self.link = None;
        self.state = SessionState::Closed;
    }
}
