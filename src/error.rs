//! Relay error taxonomy.

use std::io;

use thiserror::Error;

/// Errors produced by the relay engine.
///
/// Per-datagram failures (`MalformedPacket`, `Forward`) stay contained in
/// the handling task that hit them; `Startup` and `AlreadyRunning` surface
/// synchronously from [`Relay::start`](crate::relay::Relay::start), and the
/// two `Invalid*` variants from config validation before any socket opens.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Packet too short or structurally inconsistent to decode.
    #[error("malformed packet: {0}")]
    MalformedPacket(&'static str),

    /// Upstream unreachable, timed out, or the transport failed.
    #[error("forward failed: {0}")]
    Forward(String),

    /// The listening socket could not be bound.
    #[error("failed to bind listening socket: {0}")]
    Startup(io::Error),

    /// A relay session is already active.
    #[error("relay is already running")]
    AlreadyRunning,

    /// Listen port outside 1-65535.
    #[error("invalid listen port: {0}")]
    InvalidPort(u16),

    /// Upstream is not an IPv4 or IPv6 literal.
    #[error("invalid upstream address: {0}")]
    InvalidUpstream(String),
}
