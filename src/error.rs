//! Error types for the gate controller.
//!
//! `Error` is what starting a gate can fail with.  The leaf error types
//! are `Copy` so they can be passed through the I/O loop and the actor
//! without allocation; the adapter that produced one logs the underlying
//! cause.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Failure to bring up a gate runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// A runtime thread could not be started.
    Spawn(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Spawn(what) => write!(f, "spawn: {what}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Connection errors
// ---------------------------------------------------------------------------

/// The only error kind surfaced by the transport session.
///
/// Variants describe where the failure happened; callers are not expected
/// to branch on them beyond logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    /// Hostname resolution or TCP connect failed.
    Connect,
    /// The WebSocket upgrade was rejected or timed out.
    Handshake,
    /// Writing a frame failed (connection dropped between check and write).
    Write,
    /// Reading from the link failed.
    Read,
    /// The peer closed the connection.
    Closed,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "cannot connect"),
            Self::Handshake => write!(f, "websocket handshake failed"),
            Self::Write => write!(f, "write failed"),
            Self::Read => write!(f, "read failed"),
            Self::Closed => write!(f, "connection closed"),
        }
    }
}

impl std::error::Error for ConnectionError {}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The frame is not valid JSON.
    InvalidJson,
    /// Valid JSON, but neither a reply nor a notification we understand.
    UnrecognizedShape,
    /// A status reply or notification carried no usable contact reading.
    MissingReading,
    /// Serializing an outgoing request failed.
    Encode,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "invalid JSON"),
            Self::UnrecognizedShape => write!(f, "unrecognized frame shape"),
            Self::MissingReading => write!(f, "missing contact reading"),
            Self::Encode => write!(f, "request encoding failed"),
        }
    }
}

impl std::error::Error for CodecError {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    Parse,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "config could not be parsed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
