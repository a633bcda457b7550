//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters or the scripted in-memory relay.  No network
//! access is required.

mod gate_service_tests;
mod mock_ports;
mod runtime_tests;
mod scripted_device;
mod session_tests;
