//! Command port backed by the device's outbound channel.
//!
//! Encodes each request on the actor thread and hands the text frame to
//! the I/O thread without blocking.  A full channel drops the newest
//! request.

use std::sync::Arc;

use embassy_sync::channel::TrySendError;
use log::{debug, warn};

use crate::app::ports::{CommandPort, SendError};
use crate::rpc::channels::{OutboundMsg, OutboundQueue};
use crate::rpc::codec::{Command, encode};

pub struct QueueCommandPort {
    outbound: Arc<OutboundQueue>,
}

impl QueueCommandPort {
    pub fn new(outbound: Arc<OutboundQueue>) -> Self {
        Self { outbound }
    }
}

impl CommandPort for QueueCommandPort {
    fn send(&mut self, cmd: &Command) -> Result<(), SendError> {
        let text = encode(cmd).map_err(|e| {
            warn!("RPC: cannot encode {}: {}", cmd.method.as_str(), e);
            SendError::Encode
        })?;
        debug!("RPC: >> {}", text);
        self.outbound
            .try_send(OutboundMsg::Frame(text))
            .map_err(|_: TrySendError<OutboundMsg>| SendError::QueueFull)
    }
}
