//! Device RPC subsystem.
//!
//! JSON-RPC over a persistent WebSocket, one session per device.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      RPC Stack                             │
//! │                                                            │
//! │  ┌───────────┐   ┌──────────┐   ┌───────────────────────┐  │
//! │  │ Session   │──▶│  Codec   │──▶│  EventQueue           │  │
//! │  │ (Link)    │   │ (decode) │   │  → GateService        │  │
//! │  └───────────┘   └──────────┘   └───────────────────────┘  │
//! │       ▲                                    │               │
//! │       │              ┌─────────────────────┘               │
//! │       │              ▼                                     │
//! │  ┌───────────┐   ┌───────────────┐                         │
//! │  │ I/O task  │◀──│ OutboundQueue │   (encoded requests)    │
//! │  └───────────┘   └───────────────┘                         │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod channels;
pub mod codec;
pub mod correlation;
pub mod io_task;
pub mod messages;
pub mod transport;
