//! DriveGate library.
//!
//! Exposes the reconciliation engine, the per-device runtime and the
//! WebSocket adapters so the binary and the integration tests share one
//! implementation.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod rpc;
pub mod scheduler;
