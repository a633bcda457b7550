//! Per-device I/O thread: bridges the outbound channel and the session.
//!
//! The thread owns the [`Session`] exclusively, which is what serializes
//! connection attempts.  Two modes:
//!
//! 1. **Idle** (session closed): block on `OutboundQueue::receive()`;
//!    nothing is read and nothing reconnects until there is something to
//!    send.
//! 2. **Open**: drain every queued frame, then wait up to one poll
//!    interval for an inbound frame and hand it to the decoding handler.
//!
//! ```text
//!  ┌────────────────────────────────────────────────────────────┐
//!  │  I/O thread                                                │
//!  │                                                            │
//!  │   OutboundQueue ──▶ Session.send() ──▶ link ──▶ device     │
//!  │                                                            │
//!  │   device ──▶ link ──▶ Session.poll() ──▶ DecodingHandler   │
//!  │                                          └──▶ EventQueue   │
//!  └────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;

use log::{info, trace, warn};

use super::channels::{OutboundMsg, OutboundQueue};
use super::transport::{Connector, FrameHandler, Session};

/// What the loop should do after handling one outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

fn deliver<C: Connector>(session: &mut Session<C>, label: &str, msg: OutboundMsg) -> Flow {
    match msg {
        OutboundMsg::Frame(text) => {
            // The session already logged the cause; the request is lost.
            if let Err(e) = session.send(&text) {
                warn!("IO[{}]: request dropped ({})", label, e);
            }
            Flow::Continue
        }
        OutboundMsg::Shutdown => Flow::Stop,
    }
}

/// Run the I/O loop until a [`OutboundMsg::Shutdown`] arrives.
pub fn run_io_loop<C: Connector>(
    label: &str,
    session: &mut Session<C>,
    outbound: &OutboundQueue,
    handler: &mut dyn FrameHandler,
) {
    info!("IO[{}]: started", label);

    'outer: loop {
        if !session.is_open() {
            let msg = futures_lite::future::block_on(outbound.receive());
            if deliver(session, label, msg) == Flow::Stop {
                break;
            }
            continue;
        }

        while let Ok(msg) = outbound.try_receive() {
            if deliver(session, label, msg) == Flow::Stop {
                break 'outer;
            }
        }

        // Errors detach the link; the next send reopens it.
        if let Err(e) = session.poll(handler) {
            trace!("IO[{}]: poll ended the link ({})", label, e);
        }
    }

    session.close();
    info!("IO[{}]: stopped", label);
}

// ── Thread spawn ─────────────────────────────────────────────

/// Spawn the I/O loop on a dedicated, named thread.
pub fn spawn<C, H>(
    label: String,
    mut session: Session<C>,
    outbound: Arc<OutboundQueue>,
    mut handler: H,
) -> std::io::Result<JoinHandle<()>>
where
    C: Connector + Send + 'static,
    H: FrameHandler + Send + 'static,
{
    std::thread::Builder::new()
        .name(format!("io-{label}"))
        .spawn(move || run_io_loop(&label, &mut session, &outbound, &mut handler))
}

// ── Tests ────────────────────────────────────────────────────
