// LeGuardian Bracelet - Error Taxonomy
//
// None of these are fatal: the controller logs them and degrades (skips the
// cycle, keeps previous state).

use thiserror::Error;

/// The stream could not be opened, timed out, or dropped mid-exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable address for {0}")]
    Resolve(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("peer closed the connection before a response was received")]
    Disconnected,
    #[error("stream i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// The peer answered, but not with what the call site needs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed status line: {0:?}")]
    MalformedStatusLine(String),
    #[error("response rejected: {0:?}")]
    Rejected(String),
    #[error("expected token {0:?} missing from response")]
    MissingToken(&'static str),
    #[error("malformed body: {0}")]
    MalformedBody(String),
}

/// A sensing capability has nothing to report this cycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SensorUnavailable {
    #[error("no GNSS fix yet")]
    NoFix,
    #[error("motion sensor absent")]
    MotionSensorAbsent,
    #[error("motion sensor read failed")]
    MotionReadFailed,
    #[error("network clock not synchronised")]
    ClockUnavailable,
}

/// Failure of a full request/response exchange.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
