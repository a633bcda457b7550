//! WebSocket transport adapter.
//!
//! Implements [`Connector`] and [`Link`] over a blocking
//! `std::net::TcpStream` upgraded with `tungstenite`.  Plain `ws://`
//! only; relays on the local network do not speak TLS.
//!
//! ## Timeouts
//!
//! - TCP connect and the upgrade handshake are bounded by
//!   `connectTimeoutMs`.
//! - Once open, the socket read timeout is `pollIntervalMs`, so
//!   [`Link::recv_text`] returns `Ok(None)` after one interval of silence
//!   and the I/O loop gets to drain outbound frames.

use std::io::ErrorKind;
use std::net::{IpAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, info, warn};
use tungstenite::{Message, WebSocket};

use crate::config::TransportConfig;
use crate::error::ConnectionError;
use crate::rpc::transport::{Connector, Link};

// ───────────────────────────────────────────────────────────────
// Connector
// ───────────────────────────────────────────────────────────────

/// Opens WebSocket links to one relay.
pub struct WsConnector {
    /// `host:port` used for the TCP connect.
    addr: String,
    /// Full `ws://` URL used for the upgrade request.
    url: String,
    connect_timeout: Duration,
    poll_interval: Duration,
}

impl WsConnector {
    /// `hostname` may carry an explicit `:port`; otherwise the transport
    /// default applies.  IPv6 literals are accepted bare or bracketed.
    pub fn new(hostname: &str, transport: &TransportConfig) -> Self {
        let addr = authority(hostname, transport.port);
        let url = format!("ws://{}{}", addr, transport.path);
        Self {
            addr,
            url,
            connect_timeout: Duration::from_millis(transport.connect_timeout_ms),
            poll_interval: Duration::from_millis(transport.poll_interval_ms),
        }
    }

    fn open_tcp(&self) -> Result<TcpStream, ConnectionError> {
        let addrs = self.addr.to_socket_addrs().map_err(|e| {
            warn!("IO: cannot resolve {}: {}", self.addr, e);
            ConnectionError::Connect
        })?;

        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => debug!("IO: connect {} failed: {}", addr, e),
            }
        }
        warn!("IO: no address of {} accepted a connection", self.addr);
        Err(ConnectionError::Connect)
    }
}

impl Connector for WsConnector {
    type Link = WsLink;

    fn connect(&mut self) -> Result<WsLink, ConnectionError> {
        let stream = self.open_tcp()?;
        stream
            .set_read_timeout(Some(self.connect_timeout))
            .and_then(|()| stream.set_write_timeout(Some(self.connect_timeout)))
            .and_then(|()| stream.set_nodelay(true))
            .map_err(|e| {
                warn!("IO: socket setup failed: {}", e);
                ConnectionError::Connect
            })?;

        let (ws, response) = tungstenite::client(self.url.as_str(), stream).map_err(|e| {
            warn!("IO: handshake with {} failed: {}", self.url, e);
            ConnectionError::Handshake
        })?;
        debug!("IO: upgrade answered {}", response.status());

        ws.get_ref()
            .set_read_timeout(Some(self.poll_interval))
            .map_err(|e| {
                warn!("IO: socket setup failed: {}", e);
                ConnectionError::Connect
            })?;
        info!("IO: connected to {}", self.url);
        Ok(WsLink { ws })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// `host:port` for a configured hostname.
fn authority(hostname: &str, default_port: u16) -> String {
    if let Ok(IpAddr::V6(ip)) = hostname.parse::<IpAddr>() {
        return format!("[{ip}]:{default_port}");
    }
    let has_port = match hostname.strip_prefix('[') {
        Some(rest) => rest.contains("]:"),
        None => hostname.contains(':'),
    };
    if has_port {
        hostname.to_string()
    } else {
        format!("{hostname}:{default_port}")
    }
}

// ───────────────────────────────────────────────────────────────
// Link
// ───────────────────────────────────────────────────────────────

/// One open WebSocket connection.
pub struct WsLink {
    ws: WebSocket<TcpStream>,
}

impl Link for WsLink {
    fn send_text(&mut self, text: &str) -> Result<(), ConnectionError> {
        self.ws.send(Message::Text(text.to_string())).map_err(|e| {
            warn!("IO: write failed: {}", e);
            ConnectionError::Write
        })
    }

    fn recv_text(&mut self) -> Result<Option<String>, ConnectionError> {
        match self.ws.read() {
            Ok(Message::Text(text)) => Ok(Some(text)),
            Ok(Message::Close(frame)) => {
                info!("IO: peer closed ({:?})", frame);
                Err(ConnectionError::Closed)
            }
            // Pings are answered by tungstenite on the next write/flush.
            Ok(other) => {
                debug!("IO: ignored non-text frame ({} bytes)", other.len());
                Ok(None)
            }
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                Ok(None)
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Err(ConnectionError::Closed)
            }
            Err(e) => {
                warn!("IO: read failed: {}", e);
                Err(ConnectionError::Read)
            }
        }
    }

    fn close(&mut self) {
        if let Err(e) = self.ws.close(None) {
            debug!("IO: close: {}", e);
        }
        // Push the close frame out; the reply is not awaited.
        let _ = self.ws.flush();
    }
}
