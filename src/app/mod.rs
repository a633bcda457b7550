//! Application core: per-gate domain orchestration.
//!
//! [`service::GateService`] is the pure, I/O-free core; it talks to the
//! world only through the **port traits** in [`ports`].  [`actor`] runs
//! one service per device on its own thread and [`handle`] is the
//! thread-safe surface the UI layer holds.

pub mod actor;
pub mod commands;
pub mod events;
pub mod handle;
pub mod ports;
pub mod service;
