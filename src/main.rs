//! DriveGate main entry point
//!
//! Loads the gateway configuration, starts one runtime per gate and
//! reads simple commands from stdin in place of a home-automation UI.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WsConnector      LogEventSink   SnapshotSink   MonotonicClock │
//! │  (Connector)      (EventSink)    (EventSink)    (ClockPort)    │
//! │  QueueCommandPort                                              │
//! │  (CommandPort)                                                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              GateService (pure logic)                  │    │
//! │  │  Reconciler · Scheduler · Correlation                  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```text
//! drivegate --config gates.json [--log-level debug]
//!
//! > open gate-1
//! > close gate-1
//! > refresh gate-1
//! > status
//! > quit
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use drivegate::adapters::log_sink::LogEventSink;
use drivegate::adapters::ws_transport::WsConnector;
use drivegate::app::actor::{GateRuntime, spawn_gate};
use drivegate::config::GatewayConfig;
use drivegate::fsm::{DoorState, GateContext};

/// Gate controller for Shelly relays over WebSocket RPC
#[derive(Parser, Debug)]
#[command(name = "drivegate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (JSON format)
    #[arg(short, long)]
    config: PathBuf,

    /// Log filter (e.g. info, debug, drivegate=trace); RUST_LOG wins when set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level.as_str()))
        .format_timestamp_millis()
        .init();

    let text = std::fs::read_to_string(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;
    let config = GatewayConfig::from_json(&text)
        .with_context(|| format!("loading {}", args.config.display()))?;
    info!("Loaded {} gate(s) from {}", config.devices.len(), args.config.display());

    let mut gates = Vec::with_capacity(config.devices.len());
    for device in &config.devices {
        let connector = WsConnector::new(&device.hostname, &config.transport);
        let runtime = spawn_gate(
            device,
            config.watchdog,
            connector,
            GateContext::default(),
            LogEventSink::new(device.id.clone()),
        )
        .with_context(|| format!("starting gate '{}'", device.id))?;
        gates.push(runtime);
    }

    run_console(&gates)?;

    info!("Shutting down");
    for gate in &mut gates {
        gate.shutdown();
    }
    Ok(())
}

// ── Console ───────────────────────────────────────────────────

/// Read commands until `quit` or EOF.
fn run_console(gates: &[GateRuntime]) -> Result<()> {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            continue;
        };
        let id = words.next();

        match verb {
            "quit" | "exit" => break,
            "status" => {
                for gate in gates.iter().filter(|g| id.is_none_or(|id| g.id() == id)) {
                    print_status(gate);
                }
            }
            "open" | "close" | "refresh" => {
                let Some(gate) = id.and_then(|id| gates.iter().find(|g| g.id() == id)) else {
                    warn!("usage: {} <gate-id>", verb);
                    continue;
                };
                let handle = gate.handle();
                let queued = match verb {
                    "open" => handle.set_target_state(DoorState::Open),
                    "close" => handle.set_target_state(DoorState::Closed),
                    _ => handle.refresh(),
                };
                if !queued {
                    warn!("{}: '{}' was not queued", gate.id(), verb);
                }
            }
            other => warn!("unknown command '{}' (open, close, refresh, status, quit)", other),
        }
    }
    Ok(())
}

fn print_status(gate: &GateRuntime) {
    let snap = gate.handle().snapshot();
    let state = snap.current.map_or("unknown", DoorState::as_str);
    let target = snap.target.map_or("unknown", |t| DoorState::from(t).as_str());
    println!(
        "{}: {} (target {}){}{}",
        gate.id(),
        state,
        target,
        if snap.obstruction { " OBSTRUCTED" } else { "" },
        if snap.stale { " STALE" } else { "" },
    );
}
