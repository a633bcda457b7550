//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements         | Connects to                 |
//! |-----------------|--------------------|-----------------------------|
//! | `command_queue` | CommandPort        | Per-device outbound channel |
//! | `log_sink`      | EventSink          | `log` facade                |
//! | `snapshot_sink` | EventSink          | Shared UI snapshot          |
//! | `time`          | ClockPort          | `embassy_time::Instant`     |
//! | `ws_transport`  | Connector, Link    | TCP + WebSocket (`ws://`)   |

pub mod command_queue;
pub mod log_sink;
pub mod snapshot_sink;
pub mod time;
pub mod ws_transport;
